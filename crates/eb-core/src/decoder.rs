//! The Edgebreaker reconstruction walk: recovers connectivity and geometry
//! from a [`crate::container::DecodedContainer`] (spec §4.5 "Decoding",
//! §6.1).
//!
//! Two passes run over the opcode history. The first, [`disambiguate`],
//! widens the reduced 5-symbol stream back to the full seven triangle types
//! by replaying the M/H auxiliary tables against a running "steps since the
//! last M/H" counter — the same counter the encoder advanced while writing
//! those tables (spec §4.5 "History emission"). The second walks the
//! disambiguated history and rebuilds the active bounding loop exactly as
//! the encoder split it, just in the opposite direction: instead of finding
//! a vertex already on the loop, it is handed an offset and locates the
//! vertex by counting.
//!
//! The loop here is a plain `Vec<u32>` of *vertex indices* rather than the
//! encoder's `Vec<CornerIndex>` (Design Note 9.1): the decoder has no
//! corner table to index into, since it is busy building connectivity, not
//! consuming it.

use crate::container::DecodedContainer;
use crate::error::{EbError, EbResult};
use crate::mesh::MeshData;
use crate::opcode::{ReducedSymbol, TriangleType};
use crate::predictor::{self, IPoint3};
use crate::quantization::dequantize_axis;

/// A saved left sub-mesh loop, pushed by an `S`-split and popped by the
/// matching `E` or reached into by an `H`.
#[derive(Debug, Clone)]
struct Frame {
    loop_list: Vec<u32>,
    saved_d: IPoint3,
}

/// Output of [`decode`]: a reconstructed mesh in the same shape
/// [`crate::encoder::encode_mesh`] consumed.
#[derive(Debug, Clone)]
pub struct DecodedMesh {
    pub points: Vec<[f64; 3]>,
    pub faces: Vec<[u32; 3]>,
}

/// Recovers the full seven-symbol history from the reduced stream, using
/// the M/H tables' skip counters the way the encoder produced them: `since_m`
/// counts opcodes since the last `M` (reset by `M`, advanced by everything
/// else including `H`), and symmetrically for `since_h`. An `S`-coded token
/// is `M` if the next unconsumed M-table entry's skip matches `since_m`,
/// else `H` if the next H-table entry's skip matches `since_h`, else a
/// genuine `S`.
fn disambiguate(
    history: &[ReducedSymbol],
    m_table: &[(u32, u32)],
    h_table: &[(u32, u32, u32)],
    s_offsets: &[(u32, u32)],
) -> EbResult<Vec<TriangleType>> {
    let mut out = Vec::with_capacity(history.len());
    let mut since_m = 0u32;
    let mut since_h = 0u32;
    let mut m_i = 0usize;
    let mut h_i = 0usize;
    let mut s_i = 0usize;

    for &sym in history {
        match sym {
            ReducedSymbol::C => {
                out.push(TriangleType::C);
                since_m += 1;
                since_h += 1;
            }
            ReducedSymbol::L => {
                out.push(TriangleType::L);
                since_m += 1;
                since_h += 1;
            }
            ReducedSymbol::R => {
                out.push(TriangleType::R);
                since_m += 1;
                since_h += 1;
            }
            ReducedSymbol::E => {
                out.push(TriangleType::E);
                since_m += 1;
                since_h += 1;
            }
            ReducedSymbol::S => {
                if m_i < m_table.len() && m_table[m_i].0 == since_m {
                    out.push(TriangleType::M);
                    since_m = 0;
                    since_h += 1;
                    m_i += 1;
                } else if h_i < h_table.len() && h_table[h_i].2 == since_h {
                    out.push(TriangleType::H);
                    since_h = 0;
                    since_m += 1;
                    h_i += 1;
                } else {
                    if s_i >= s_offsets.len() {
                        return Err(EbError::MalformedInput(
                            "opcode history has more S triangles than the S-offset table".into(),
                        ));
                    }
                    out.push(TriangleType::S);
                    since_m += 1;
                    since_h += 1;
                    s_i += 1;
                }
            }
        }
    }

    if m_i != m_table.len() || h_i != h_table.len() || s_i != s_offsets.len() {
        return Err(EbError::MalformedInput(
            "auxiliary table entries left unconsumed after disambiguation".into(),
        ));
    }
    Ok(out)
}

struct Walker {
    next_index: u32,
    points: Vec<IPoint3>,
    faces: Vec<[u32; 3]>,
}

impl Walker {
    fn fresh_vertex(&mut self, point: IPoint3) -> u32 {
        let idx = self.next_index;
        self.next_index += 1;
        self.points.push(point);
        idx
    }
}

/// Rebuilds connectivity and quantized geometry from a decoded container.
pub fn reconstruct(container: &DecodedContainer) -> EbResult<(Vec<IPoint3>, Vec<[u32; 3]>)> {
    let history = disambiguate(
        &container.history,
        &container.m_table,
        &container.h_table,
        &container.s_offsets,
    )?;

    let mut residuals = container.residuals.iter();
    let mut next_residual = || -> EbResult<IPoint3> {
        residuals
            .next()
            .copied()
            .ok_or_else(|| EbError::MalformedInput("not enough geometry residuals".into()))
    };

    let mut w = Walker {
        next_index: 0,
        points: Vec::with_capacity(container.vertex_count as usize),
        faces: Vec::new(),
    };

    let gp0 = w.fresh_vertex(predictor::reconstruct(
        predictor::predict(None, None, None),
        next_residual()?,
    ));
    let g0 = w.fresh_vertex(predictor::reconstruct(
        predictor::predict(Some(w.points[gp0 as usize]), None, None),
        next_residual()?,
    ));

    let mut loop_list: Vec<u32> = vec![gp0, g0];
    let mut last_d: Option<IPoint3> = None;
    let mut stack: Vec<Frame> = Vec::new();
    let mut s_cursor = 0usize;
    let mut h_cursor = 0usize;
    let mut m_cursor = 0usize;

    for &sym in &history {
        if loop_list.len() < 2 {
            return Err(EbError::MalformedInput(
                "active loop underflowed during reconstruction".into(),
            ));
        }
        let len = loop_list.len();
        let gp = loop_list[0];
        let g = loop_list[1 % len];
        let a = w.points[gp as usize];
        let b = w.points[g as usize];
        let predicted = predictor::predict(Some(a), Some(b), last_d);

        match sym {
            TriangleType::C => {
                // Insert the new vertex right after `gp`, then rotate `gp`
                // to the back so the gate keeps its `[gate_p, gate, ...]`
                // shape for the next iteration: the new gate is `(d, g)`.
                let d = predictor::reconstruct(predicted, next_residual()?);
                let d_idx = w.fresh_vertex(d);
                w.faces.push([gp, g, d_idx]);
                let mut new_loop = Vec::with_capacity(len + 1);
                new_loop.push(d_idx);
                new_loop.extend_from_slice(&loop_list[1..]);
                new_loop.push(gp);
                loop_list = new_loop;
                last_d = Some(d);
            }
            TriangleType::M => {
                // Read the hole's vertex count from the M table and insert
                // all `length` fresh vertices between `gp` and `g`: the
                // apex (also the triangle's third vertex) leads, the loop
                // wraps back through the rest of the hole walk, and the new
                // gate is `(apex, g)` — same shape as C, just with `length`
                // new vertices instead of one (spec §4.6 M, decoder.cpp's
                // `table_generating`).
                let &(_, length) = container.m_table.get(m_cursor).ok_or_else(|| {
                    EbError::MalformedInput("M table exhausted during reconstruction".into())
                })?;
                m_cursor += 1;
                let length = length as usize;
                if length < 3 {
                    return Err(EbError::MalformedInput(
                        "M table hole length must be at least 3".into(),
                    ));
                }

                let mut hole_verts = Vec::with_capacity(length);
                for _ in 0..length {
                    let d = predictor::reconstruct(predicted, next_residual()?);
                    hole_verts.push(w.fresh_vertex(d));
                }
                let apex = hole_verts[0];
                w.faces.push([gp, g, apex]);

                let mut new_loop = Vec::with_capacity(len + length + 1);
                new_loop.push(apex);
                new_loop.extend_from_slice(&loop_list[1..]);
                new_loop.push(gp);
                new_loop.extend_from_slice(&hole_verts);
                loop_list = new_loop;
                last_d = Some(w.points[apex as usize]);
            }
            TriangleType::L => {
                // Apex is the vertex preceding `gp`: merge it in, dropping
                // `gp` from the loop. New gate is `(q, g)`.
                let q = loop_list[len - 1];
                let d = w.points[q as usize];
                w.faces.push([gp, g, q]);
                let mut new_loop = Vec::with_capacity(len - 1);
                new_loop.push(q);
                new_loop.extend_from_slice(&loop_list[1..len - 1]);
                loop_list = new_loop;
                last_d = Some(d);
            }
            TriangleType::R => {
                // Apex is the vertex following `g`: merge it in, dropping
                // `g` from the loop. New gate is `(gp, gn)`.
                let gn = loop_list[2 % len];
                let d = w.points[gn as usize];
                w.faces.push([gp, g, gn]);
                loop_list.remove(1);
                last_d = Some(d);
            }
            TriangleType::E => {
                if len != 3 {
                    return Err(EbError::MalformedInput(
                        "E triangle did not close a 3-vertex loop".into(),
                    ));
                }
                let gn = loop_list[2];
                w.faces.push([gp, g, gn]);
                if let Some(frame) = stack.pop() {
                    loop_list = frame.loop_list;
                    last_d = Some(frame.saved_d);
                } else {
                    loop_list.clear();
                }
            }
            TriangleType::S => {
                // `D` sits at position `offset + 2`: the loop splits into a
                // right part that stays active (gate becomes `(gp, D)`) and
                // a left part (`g` through `D`) frozen onto the work stack,
                // rotated so its own first gate is `(D, g)`.
                let &(_, offset) = container.s_offsets.get(s_cursor).ok_or_else(|| {
                    EbError::MalformedInput("S-offset table exhausted during reconstruction".into())
                })?;
                s_cursor += 1;
                let k = offset as usize + 2;
                if k >= len {
                    return Err(EbError::MalformedInput(
                        "S-offset points past the end of the active loop".into(),
                    ));
                }
                let d_idx = loop_list[k];
                let d = w.points[d_idx as usize];
                w.faces.push([gp, g, d_idx]);

                let mut left = Vec::with_capacity(k);
                left.push(d_idx);
                left.extend_from_slice(&loop_list[1..k]);

                let mut right = Vec::with_capacity(len - k + 1);
                right.push(gp);
                right.push(d_idx);
                right.extend_from_slice(&loop_list[k + 1..]);

                stack.push(Frame {
                    loop_list: left,
                    saved_d: a,
                });
                loop_list = right;
                last_d = Some(d);
            }
            TriangleType::H => {
                // Reaches into a saved frame for `D` at `offset` within it,
                // rotates that frame so `D` leads, and splices the whole
                // thing back in between `gp` and `g`. New gate is `(gp, D)`.
                let &(position, offset, _) = container.h_table.get(h_cursor).ok_or_else(|| {
                    EbError::MalformedInput("H table exhausted during reconstruction".into())
                })?;
                h_cursor += 1;
                let frame_idx = position as usize;
                if frame_idx >= stack.len() {
                    return Err(EbError::MalformedInput(
                        "H entry references a sub-mesh frame that is not on the stack".into(),
                    ));
                }
                let frame = stack.remove(frame_idx);
                let m = frame.loop_list.len();
                let d_pos = offset as usize;
                if d_pos >= m {
                    return Err(EbError::MalformedInput(
                        "H offset points past the end of its saved frame".into(),
                    ));
                }
                let d_idx = frame.loop_list[d_pos];
                let d = w.points[d_idx as usize];
                w.faces.push([gp, g, d_idx]);

                let mut frame_rot = Vec::with_capacity(m);
                frame_rot.extend_from_slice(&frame.loop_list[d_pos..]);
                frame_rot.extend_from_slice(&frame.loop_list[..d_pos]);

                let mut new_loop = Vec::with_capacity(len + m);
                new_loop.push(gp);
                new_loop.extend(frame_rot);
                new_loop.push(g);
                new_loop.extend_from_slice(&loop_list[2..]);
                loop_list = new_loop;
                last_d = Some(d);
            }
        }
    }

    Ok((w.points, w.faces))
}

/// Decodes the EB file already parsed into `container` back into a real
/// mesh, re-quantizing every point with the stored per-axis step.
pub fn decode(container: &DecodedContainer) -> EbResult<DecodedMesh> {
    let (points, faces) = reconstruct(container)?;
    let steps = [
        container.steps[0].to_step(),
        container.steps[1].to_step(),
        container.steps[2].to_step(),
    ];
    let real_points = points
        .iter()
        .map(|p| {
            [
                dequantize_axis(p[0], steps[0]),
                dequantize_axis(p[1], steps[1]),
                dequantize_axis(p[2], steps[2]),
            ]
        })
        .collect();
    Ok(DecodedMesh {
        points: real_points,
        faces,
    })
}

/// Reads and decodes a full EB file in one call.
pub fn decode_eb_file<R: std::io::Read>(source: &mut R) -> EbResult<DecodedMesh> {
    let container = crate::container::read_eb_file(source)?;
    decode(&container)
}

impl From<DecodedMesh> for MeshData {
    fn from(d: DecodedMesh) -> Self {
        MeshData::new(d.points, d.faces)
    }
}
