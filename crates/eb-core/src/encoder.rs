//! The Edgebreaker connectivity traversal and parallelogram geometry
//! encoder (spec §4.5).
//!
//! The active bounding loop and each saved sub-mesh frame are modelled as
//! plain `Vec<u32>` vertex-index arenas rather than a linked list of
//! ambient pointers (Design Note 9.1): the loop's front two entries are
//! always the current gate `(gate_p, gate)`, which keeps the per-type
//! splice logic a few `Vec` insert/remove calls instead of pointer
//! surgery, and keeps this side's bookkeeping in exactly the
//! representation [`crate::decoder`] rebuilds from the opcode history —
//! the two are mirror images of the same splice rules, one discovering a
//! vertex's position by searching, the other by a table lookup. S-splits
//! push a frame onto an explicit work stack (Design Note 9.2) instead of
//! recursing.

use std::collections::HashMap;

use crate::compression_config::CompressionOptions;
use crate::error::{EbError, EbResult};
use crate::geometry_indices::{CornerIndex, VertexIndex};
use crate::mesh::{HalfEdgeMesh, MeshData, VERTEX_ACTIVE, VERTEX_FROZEN, VERTEX_HOLE, VERTEX_UNTOUCHED};
use crate::opcode::{choose_code_series, CodeSeries, TriangleType};
use crate::predictor::{self, IPoint3};
use crate::quantization::quantize_axis;

/// A saved left sub-mesh, pushed when an `S`-split recurses into the right
/// sub-mesh and popped either by the matching `E` (ordinary resume) or by
/// an `H` (handle merge) reaching into it from the currently active loop.
#[derive(Debug, Clone)]
struct Frame {
    loop_list: Vec<u32>,
    saved_d: IPoint3,
}

/// Everything the container needs to write an EB file: the opcode
/// history, the three auxiliary tables, and the per-vertex geometry
/// residuals in vertex-index order.
#[derive(Debug, Clone)]
pub struct EncodedMesh {
    pub vertex_count: usize,
    pub face_count: usize,
    pub history: Vec<TriangleType>,
    pub code_series: CodeSeries,
    /// `(skip_count, hole_length)`.
    pub m_table: Vec<(u32, u32)>,
    /// `(position, offset, skip_count)`.
    pub h_table: Vec<(u32, u32, u32)>,
    /// `(s_index, offset)` for every genuine `S` triangle.
    pub s_offsets: Vec<(u32, u32)>,
    /// Quantized residual per vertex index, in introduction order.
    pub residuals: Vec<IPoint3>,
    pub bits_per_axis: [u32; 3],
    pub steps: [f64; 3],
}

pub struct Encoder<'m> {
    mesh: &'m HalfEdgeMesh,
    options: CompressionOptions,
    vertex_marks: Vec<u8>,
    /// Maps a real directed mesh edge `(start, end)` to the corner that
    /// represents it, so the traversal can recover the apex of the gate
    /// edge without re-deriving it from `loop_list` position bookkeeping.
    edge_corner: HashMap<(u32, u32), CornerIndex>,
    assigned_index: Vec<u32>,
    q_points: Vec<IPoint3>,
    next_index: u32,
    history: Vec<TriangleType>,
    m_table: Vec<(u32, u32)>,
    h_table: Vec<(u32, u32, u32)>,
    s_offsets: Vec<(u32, u32)>,
    residuals: Vec<IPoint3>,
    stack: Vec<Frame>,
    skip_m: u32,
    skip_h: u32,
    s_index: u32,
}

impl<'m> Encoder<'m> {
    pub fn new(mesh: &'m HalfEdgeMesh, options: CompressionOptions) -> Self {
        let n = mesh.num_vertices();
        let mut edge_corner = HashMap::new();
        for c in 0..mesh.corner_table.num_corners() {
            let c = CornerIndex(c as u32);
            edge_corner.insert(
                (mesh.edge_start(c).0, mesh.edge_end(c).0),
                c,
            );
        }
        Self {
            mesh,
            options,
            vertex_marks: mesh.vertex_marks.clone(),
            edge_corner,
            assigned_index: vec![u32::MAX; n],
            q_points: Vec::new(),
            next_index: 0,
            history: Vec::new(),
            m_table: Vec::new(),
            h_table: Vec::new(),
            s_offsets: Vec::new(),
            residuals: vec![[0, 0, 0]; n],
            stack: Vec::new(),
            skip_m: 0,
            skip_h: 0,
            s_index: 0,
        }
    }

    /// The real mesh corner for the directed edge `start -> end`, i.e. the
    /// half-edge the traversal's current gate corresponds to.
    fn corner_for(&self, start: u32, end: u32) -> CornerIndex {
        *self
            .edge_corner
            .get(&(start, end))
            .expect("gate edge must exist in the real mesh connectivity")
    }

    fn quantize_all(&mut self) -> EbResult<()> {
        let mut seen: HashMap<IPoint3, VertexIndex> = HashMap::new();
        let mut q_points = Vec::with_capacity(self.mesh.num_vertices());
        for (i, p) in self.mesh.points.iter().enumerate() {
            let q = [
                quantize_axis(p[0], self.options.steps[0], self.options.bits[0])?,
                quantize_axis(p[1], self.options.steps[1], self.options.bits[1])?,
                quantize_axis(p[2], self.options.steps[2], self.options.bits[2])?,
            ];
            if let Some(&other) = seen.get(&q) {
                return Err(EbError::UnsupportedMesh(format!(
                    "vertices {} and {} coincide after quantization",
                    other.0, i
                )));
            }
            seen.insert(q, VertexIndex(i as u32));
            q_points.push(q);
        }
        self.q_points = q_points;
        Ok(())
    }

    /// Gives `v` (an original mesh vertex) the next free traversal index
    /// and records its residual against `predicted`.
    fn introduce_vertex(&mut self, v: VertexIndex, predicted: IPoint3) -> u32 {
        let idx = self.next_index;
        self.next_index += 1;
        self.assigned_index[v.0 as usize] = idx;
        let actual = self.q_points[v.0 as usize];
        let residual = predictor::residual(actual, predicted);
        if (idx as usize) < self.residuals.len() {
            self.residuals[idx as usize] = residual;
        } else {
            self.residuals.push(residual);
        }
        self.vertex_marks[v.0 as usize] = 1;
        idx
    }

    fn point_of(&self, v: VertexIndex) -> IPoint3 {
        self.q_points[v.0 as usize]
    }

    /// Runs the full traversal and geometry encode, producing the data the
    /// EB container writes out.
    pub fn encode(mut self) -> EbResult<EncodedMesh> {
        self.quantize_all()?;

        let initial_gate = if self.mesh.is_closed() {
            CornerIndex(0)
        } else {
            self.mesh.tri_next(self.mesh.border_loops[0].corners[0])
        };

        let gp0 = self.mesh.edge_start(initial_gate);
        let g0 = self.mesh.edge_end(initial_gate);
        self.introduce_vertex(gp0, predictor::predict(None, None, None));
        self.introduce_vertex(
            g0,
            predictor::predict(Some(self.point_of(gp0)), None, None),
        );

        let mut loop_list: Vec<u32> = vec![gp0.0, g0.0];
        let mut last_d: Option<IPoint3> = None;

        loop {
            let len = loop_list.len();
            let gp = loop_list[0];
            let g = loop_list[1 % len];
            let gate = self.corner_for(gp, g);
            let v = self.mesh.apex(gate);
            let mark = self.vertex_marks[v.0 as usize];

            let a = self.point_of(VertexIndex(gp));
            let b = self.point_of(VertexIndex(g));
            let predicted = predictor::predict(Some(a), Some(b), last_d);

            // Where (if anywhere) `v` already sits: the immediate loop
            // neighbors make this `L`/`R`/`E`; elsewhere on the active loop
            // makes it a genuine `S`; on a saved frame makes it `H`.
            let on_left_neighbor = v.0 == loop_list[len - 1];
            let on_right_neighbor = v.0 == loop_list[2 % len];

            let sym = if mark == VERTEX_UNTOUCHED {
                TriangleType::C
            } else if mark == VERTEX_HOLE {
                TriangleType::M
            } else if on_left_neighbor && on_right_neighbor {
                TriangleType::E
            } else if on_right_neighbor {
                TriangleType::R
            } else if on_left_neighbor {
                TriangleType::L
            } else if mark == VERTEX_FROZEN {
                TriangleType::H
            } else {
                TriangleType::S
            };

            match sym {
                TriangleType::C => {
                    self.introduce_vertex(v, predicted);
                    self.skip_m += 1;
                    self.skip_h += 1;
                    self.history.push(sym);

                    let mut new_loop = Vec::with_capacity(len + 1);
                    new_loop.push(v.0);
                    new_loop.extend_from_slice(&loop_list[1..]);
                    new_loop.push(gp);
                    loop_list = new_loop;
                    last_d = Some(v_point(self, v));
                }
                TriangleType::M => {
                    // `v` is the first untouched vertex of a hole boundary
                    // (mark 2). Walk the whole hole starting at `v`,
                    // assigning each of its ℓ vertices a fresh index and
                    // mark 1 (spec §4.5 M), then splice the full walk into
                    // the active loop exactly as the single-vertex C splice
                    // does, just with ℓ vertices instead of one.
                    let (hole_idx, start) = self
                        .mesh
                        .border_loops
                        .iter()
                        .enumerate()
                        .skip(1)
                        .find_map(|(i, bl)| {
                            bl.corners
                                .iter()
                                .position(|&c| self.mesh.edge_start(c) == v)
                                .map(|pos| (i, pos))
                        })
                        .expect("M triangle's apex must lie on a detected hole boundary");
                    let corners = self.mesh.border_loops[hole_idx].corners.clone();
                    let hole_len = corners.len();

                    let hole_verts: Vec<VertexIndex> = (0..hole_len)
                        .map(|i| self.mesh.edge_start(corners[(start + i) % hole_len]))
                        .collect();
                    debug_assert_eq!(hole_verts[0], v);

                    for &hv in &hole_verts {
                        self.introduce_vertex(hv, predicted);
                    }

                    self.m_table.push((self.skip_m, hole_len as u32));
                    self.skip_m = 0;
                    self.skip_h += 1;
                    self.history.push(sym);

                    let mut new_loop = Vec::with_capacity(len + hole_len + 1);
                    new_loop.push(v.0);
                    new_loop.extend_from_slice(&loop_list[1..]);
                    new_loop.push(gp);
                    new_loop.extend(hole_verts.iter().map(|hv| hv.0));
                    loop_list = new_loop;
                    last_d = Some(v_point(self, v));
                }
                TriangleType::L => {
                    self.history.push(sym);
                    self.skip_m += 1;
                    self.skip_h += 1;
                    let q = loop_list[len - 1];
                    let mut new_loop = Vec::with_capacity(len - 1);
                    new_loop.push(q);
                    new_loop.extend_from_slice(&loop_list[1..len - 1]);
                    loop_list = new_loop;
                    last_d = Some(v_point(self, v));
                }
                TriangleType::R => {
                    self.history.push(sym);
                    self.skip_m += 1;
                    self.skip_h += 1;
                    loop_list.remove(1);
                    last_d = Some(v_point(self, v));
                }
                TriangleType::E => {
                    self.history.push(sym);
                    if let Some(frame) = self.stack.pop() {
                        self.skip_m += 1;
                        self.skip_h += 1;
                        loop_list = frame.loop_list;
                        last_d = Some(frame.saved_d);
                    } else {
                        break;
                    }
                }
                TriangleType::S => {
                    let k = find_split(&loop_list, v.0);
                    let offset = (k - 2) as u32;
                    self.s_offsets.push((self.s_index, offset));
                    self.s_index += 1;
                    self.history.push(sym);
                    self.skip_m += 1;
                    self.skip_h += 1;

                    let mut left = Vec::with_capacity(k);
                    left.push(v.0);
                    left.extend_from_slice(&loop_list[1..k]);
                    for &fv in &left {
                        self.mark_frozen(VertexIndex(fv));
                    }

                    let mut right = Vec::with_capacity(len - k + 1);
                    right.push(gp);
                    right.push(v.0);
                    right.extend_from_slice(&loop_list[k + 1..]);

                    self.stack.push(Frame {
                        loop_list: left,
                        saved_d: a,
                    });
                    loop_list = right;
                    last_d = Some(v_point(self, v));
                }
                TriangleType::H => {
                    let frame_idx = self
                        .stack
                        .iter()
                        .position(|f| f.loop_list.contains(&v.0))
                        .expect("H triangle's apex must lie on a saved frame");
                    let frame = self.stack.remove(frame_idx);
                    let d_pos = frame
                        .loop_list
                        .iter()
                        .position(|&fv| fv == v.0)
                        .expect("saved frame must contain the merge vertex");
                    self.h_table
                        .push((frame_idx as u32, d_pos as u32, self.skip_h));
                    self.skip_h = 0;
                    self.history.push(sym);
                    self.skip_m += 1;

                    for &fv in &frame.loop_list {
                        self.unmark_frozen(VertexIndex(fv));
                    }

                    let m = frame.loop_list.len();
                    let mut frame_rot = Vec::with_capacity(m);
                    frame_rot.extend_from_slice(&frame.loop_list[d_pos..]);
                    frame_rot.extend_from_slice(&frame.loop_list[..d_pos]);

                    let mut new_loop = Vec::with_capacity(len + m);
                    new_loop.push(gp);
                    new_loop.extend(frame_rot);
                    new_loop.push(g);
                    new_loop.extend_from_slice(&loop_list[2..]);
                    loop_list = new_loop;
                    last_d = Some(v_point(self, v));
                }
            }

            if loop_list.is_empty() {
                break;
            }
        }

        let code_series = choose_code_series(&self.history);
        Ok(EncodedMesh {
            vertex_count: self.next_index as usize,
            face_count: self.mesh.num_faces(),
            history: self.history,
            code_series,
            m_table: self.m_table,
            h_table: self.h_table,
            s_offsets: self.s_offsets,
            residuals: self.residuals,
            bits_per_axis: self.options.bits,
            steps: self.options.steps,
        })
    }

    fn mark_frozen(&mut self, v: VertexIndex) {
        self.vertex_marks[v.0 as usize] = VERTEX_FROZEN;
    }

    fn unmark_frozen(&mut self, v: VertexIndex) {
        self.vertex_marks[v.0 as usize] = VERTEX_ACTIVE;
    }
}

fn v_point(enc: &Encoder, v: VertexIndex) -> IPoint3 {
    enc.point_of(v)
}

/// Finds the position in `loop_list` (skipping the gate pair at indices 0
/// and 1) whose vertex equals `target`, i.e. the merge point of a genuine
/// `S`-split.
fn find_split(loop_list: &[u32], target: u32) -> usize {
    for (i, &v) in loop_list.iter().enumerate().skip(2) {
        if v == target {
            return i;
        }
    }
    panic!("S-split merge vertex not found on the active loop")
}

/// Convenience entry point: builds the half-edge mesh and runs the
/// encoder in one call.
pub fn encode_mesh(mesh: &MeshData, options: CompressionOptions) -> EbResult<EncodedMesh> {
    let half = HalfEdgeMesh::build(mesh)?;
    if half.num_faces() == 0 {
        return Err(EbError::UnsupportedMesh("mesh has no faces".into()));
    }
    Encoder::new(&half, options).encode()
}
