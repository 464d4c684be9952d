//! EB file framing: header, opcode history, the three auxiliary tables,
//! and the arithmetic-coded geometry payload (spec §6.1).
//!
//! Every integer header field is a 32-bit word: two zero padding bits
//! followed by a 30-bit payload, written with `put_bits(0, 2)` then
//! `put_bits(value, 30)`. Every section (header, history, each table,
//! geometry) ends on a byte boundary via an explicit `align()` call on
//! both the write and read side, mirroring the bit-stream contract in
//! `bit_stream.rs`.

use std::io::{Read, Write};

use crate::arithmetic_coder::{ArithmeticDecoder, ArithmeticEncoder, DEFAULT_MAX_FREQUENCY};
use crate::bit_stream::{BitReader, BitWriter};
use crate::context_selector::ContextSelector;
use crate::encoder::EncodedMesh;
use crate::error::{EbError, EbResult};
use crate::opcode::{self, CodeSeries, ReducedSymbol};
use crate::quantization::QuantizationStep;

/// Payload of the signature field (spec §6.1 item 1).
pub const SIGNATURE: u32 = 696_610_198;

const U30_MAX: u32 = (1 << 30) - 1;

/// Number of full-binary-tree levels used by the per-axis context
/// selector, capped at the axis's own bit width.
fn f_levels_for(bits: u32) -> u32 {
    bits.min(4).max(1)
}

fn write_u30<W: Write>(w: &mut BitWriter<W>, value: u32) -> EbResult<()> {
    if value > U30_MAX {
        return Err(EbError::Overflow(format!(
            "header field {value} does not fit in 30 bits"
        )));
    }
    w.put_bits(0, 2)?;
    w.put_bits(value, 30)
}

fn read_u30<R: Read>(r: &mut BitReader<R>) -> EbResult<u32> {
    let pad = r.get_bits(2)?;
    if pad != 0 {
        return Err(EbError::MalformedInput(
            "non-zero padding bits in a header field".into(),
        ));
    }
    r.get_bits(30)
}

fn write_step<W: Write>(w: &mut BitWriter<W>, step: QuantizationStep) -> EbResult<()> {
    if step.exp > U30_MAX {
        return Err(EbError::Overflow("quantization exponent does not fit in 30 bits".into()));
    }
    w.put_bits(step.coef, 32)?;
    w.put_bits(0, 1)?;
    w.put_bits(if step.non_negative { 1 } else { 0 }, 1)?;
    w.put_bits(step.exp, 30)
}

fn read_step<R: Read>(r: &mut BitReader<R>) -> EbResult<QuantizationStep> {
    let coef = r.get_bits(32)?;
    let pad = r.get_bits(1)?;
    if pad != 0 {
        return Err(EbError::MalformedInput("non-zero padding bit in a step record".into()));
    }
    let sign = r.get_bits(1)?;
    let exp = r.get_bits(30)?;
    Ok(QuantizationStep {
        coef,
        non_negative: sign == 1,
        exp,
    })
}

/// The decoded header plus every section's raw contents, ready for
/// [`crate::decoder::Decoder`] to reconstruct a mesh from.
#[derive(Debug, Clone)]
pub struct DecodedContainer {
    pub code_series: CodeSeries,
    pub vertex_count: u32,
    pub history: Vec<ReducedSymbol>,
    pub m_table: Vec<(u32, u32)>,
    pub h_table: Vec<(u32, u32, u32)>,
    pub s_offsets: Vec<(u32, u32)>,
    pub bits_per_axis: [u32; 3],
    pub steps: [QuantizationStep; 3],
    pub residuals: Vec<[i64; 3]>,
}

/// Writes `encoded` as a complete EB file.
pub fn write_eb_file<W: Write>(sink: &mut W, encoded: &EncodedMesh) -> EbResult<()> {
    let steps = [
        QuantizationStep::from_step(encoded.steps[0])?,
        QuantizationStep::from_step(encoded.steps[1])?,
        QuantizationStep::from_step(encoded.steps[2])?,
    ];
    let h_len = opcode::history_bit_length(&encoded.history, encoded.code_series);

    let mut w = BitWriter::new(sink);
    write_u30(&mut w, SIGNATURE)?;
    write_u30(&mut w, encoded.code_series as u32)?;
    write_u30(&mut w, u32::try_from(h_len).map_err(|_| {
        EbError::Overflow("opcode history is too long to address in 30 bits".into())
    })?)?;
    write_u30(&mut w, encoded.vertex_count as u32)?;
    write_u30(&mut w, encoded.m_table.len() as u32)?;
    write_u30(&mut w, encoded.h_table.len() as u32)?;
    write_u30(&mut w, encoded.s_offsets.len() as u32)?;
    for b in encoded.bits_per_axis {
        write_u30(&mut w, b)?;
    }
    for step in steps {
        write_step(&mut w, step)?;
    }
    w.align()?;

    opcode::write_history(&mut w, &encoded.history, encoded.code_series)?;
    w.align()?;

    for &(skip, length) in &encoded.m_table {
        write_u30(&mut w, skip)?;
        write_u30(&mut w, length)?;
    }
    if !encoded.m_table.is_empty() {
        w.align()?;
    }

    for &(position, offset, skip) in &encoded.h_table {
        write_u30(&mut w, position)?;
        write_u30(&mut w, offset)?;
        write_u30(&mut w, skip)?;
    }
    if !encoded.h_table.is_empty() {
        w.align()?;
    }

    for &(s_index, offset) in &encoded.s_offsets {
        write_u30(&mut w, s_index)?;
        write_u30(&mut w, offset)?;
    }
    if !encoded.s_offsets.is_empty() {
        w.align()?;
    }

    write_geometry(&mut w, encoded)?;
    w.flush()?;
    Ok(())
}

fn write_geometry<W: Write>(w: &mut BitWriter<W>, encoded: &EncodedMesh) -> EbResult<()> {
    let bank_sizes: [u32; 3] = encoded
        .bits_per_axis
        .map(|b| ContextSelector::total_contexts(b, f_levels_for(b)));
    let total_contexts: u32 = bank_sizes.iter().sum();
    let bank_offset = [0u32, bank_sizes[0], bank_sizes[0] + bank_sizes[1]];

    // The arithmetic coder owns the remainder of the writer's sink; drain
    // the bit stream into a scratch buffer and splice it back in, since
    // `ArithmeticEncoder::new` wants exclusive access to `W`.
    let mut scratch = Vec::new();
    {
        let mut enc = ArithmeticEncoder::new(&mut scratch, total_contexts as usize, DEFAULT_MAX_FREQUENCY);
        enc.start();
        for residual in &encoded.residuals {
            for axis in 0..3 {
                let value = residual[axis];
                let sign_bit = if value >= 0 { 1 } else { 0 };
                enc.encode_bypass(sign_bit)?;
                let n_bits = encoded.bits_per_axis[axis];
                let magnitude = value.unsigned_abs() as u32;
                let masked = if n_bits >= 32 {
                    magnitude
                } else {
                    magnitude & ((1u32 << n_bits) - 1)
                };
                let mut sel = ContextSelector::new(n_bits, f_levels_for(n_bits))?;
                for i in (0..n_bits).rev() {
                    let bit = (masked >> i) & 1;
                    let ctx = sel.get_context();
                    if ctx < 0 {
                        enc.encode_bypass(bit)?;
                    } else {
                        enc.encode_regular(bank_offset[axis] as usize + ctx as usize, bit)?;
                    }
                    sel.feed_bit(bit)?;
                }
            }
        }
        enc.terminate()?;
        enc.align()?;
    }
    for byte in scratch {
        w.put_bits(byte as u32, 8)?;
    }
    Ok(())
}

/// Reads a complete EB file, returning every raw section for
/// [`crate::decoder::Decoder`] to interpret.
pub fn read_eb_file<R: Read>(source: &mut R) -> EbResult<DecodedContainer> {
    let code_series;
    let vertex_count;
    let hole_count;
    let handle_count;
    let s_offset_count;
    let bits_per_axis;
    let steps;
    let history;
    let mut m_table = Vec::new();
    let mut h_table = Vec::new();
    let mut s_offsets = Vec::new();

    {
        let mut r = BitReader::new(&mut *source);
        let signature = read_u30(&mut r)?;
        if signature != SIGNATURE {
            return Err(EbError::MalformedInput(format!(
                "bad EB signature: expected {SIGNATURE}, got {signature}"
            )));
        }
        code_series = CodeSeries::from_u32(read_u30(&mut r)?)?;
        let h_len = read_u30(&mut r)? as u64;
        vertex_count = read_u30(&mut r)?;
        hole_count = read_u30(&mut r)?;
        handle_count = read_u30(&mut r)?;
        s_offset_count = read_u30(&mut r)?;
        bits_per_axis = [read_u30(&mut r)?, read_u30(&mut r)?, read_u30(&mut r)?];
        steps = [read_step(&mut r)?, read_step(&mut r)?, read_step(&mut r)?];
        r.align();

        history = opcode::read_history(&mut r, code_series, h_len)?;
        r.align();

        for _ in 0..hole_count {
            let skip = read_u30(&mut r)?;
            let length = read_u30(&mut r)?;
            if length < 3 {
                return Err(EbError::MalformedInput(format!(
                    "M-table entry has length {length} < 3"
                )));
            }
            m_table.push((skip, length));
        }
        if hole_count > 0 {
            r.align();
        }

        for _ in 0..handle_count {
            let position = read_u30(&mut r)?;
            let offset = read_u30(&mut r)?;
            let skip = read_u30(&mut r)?;
            h_table.push((position, offset, skip));
        }
        if handle_count > 0 {
            r.align();
        }

        for _ in 0..s_offset_count {
            let s_index = read_u30(&mut r)?;
            let offset = read_u30(&mut r)?;
            s_offsets.push((s_index, offset));
        }
        if s_offset_count > 0 {
            r.align();
        }
        // `r` borrows `source` only for this block; once it drops here the
        // geometry payload can claim the byte source directly, since both
        // sides left it at the same byte-aligned position.
    }

    let residuals = read_geometry(source, vertex_count as usize, bits_per_axis)?;

    Ok(DecodedContainer {
        code_series,
        vertex_count,
        history,
        m_table,
        h_table,
        s_offsets,
        bits_per_axis,
        steps,
        residuals,
    })
}

fn read_geometry<R: Read>(
    source: &mut R,
    vertex_count: usize,
    bits_per_axis: [u32; 3],
) -> EbResult<Vec<[i64; 3]>> {
    let bank_sizes: [u32; 3] = bits_per_axis.map(|b| ContextSelector::total_contexts(b, f_levels_for(b)));
    let total_contexts: u32 = bank_sizes.iter().sum();
    let bank_offset = [0u32, bank_sizes[0], bank_sizes[0] + bank_sizes[1]];

    let mut dec = ArithmeticDecoder::new(source, total_contexts as usize, DEFAULT_MAX_FREQUENCY);
    dec.start()?;
    let mut out = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let mut point = [0i64; 3];
        for axis in 0..3 {
            let sign_bit = dec.decode_bypass()?;
            let n_bits = bits_per_axis[axis];
            let mut sel = ContextSelector::new(n_bits, f_levels_for(n_bits))?;
            let mut magnitude: u32 = 0;
            for _ in 0..n_bits {
                let ctx = sel.get_context();
                let bit = if ctx < 0 {
                    dec.decode_bypass()?
                } else {
                    dec.decode_regular(bank_offset[axis] as usize + ctx as usize)?
                };
                magnitude = (magnitude << 1) | bit;
                sel.feed_bit(bit)?;
            }
            point[axis] = if sign_bit == 1 {
                magnitude as i64
            } else {
                -(magnitude as i64)
            };
        }
        out.push(point);
    }
    dec.terminate()?;
    dec.align();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::TriangleType;

    fn sample_encoded() -> EncodedMesh {
        EncodedMesh {
            vertex_count: 4,
            face_count: 4,
            history: vec![TriangleType::C, TriangleType::R, TriangleType::R, TriangleType::E],
            code_series: CodeSeries::One,
            m_table: Vec::new(),
            h_table: Vec::new(),
            s_offsets: Vec::new(),
            residuals: vec![[0, 0, 0], [1, 0, 0], [-1, 2, 0], [3, -3, 4]],
            bits_per_axis: [8, 8, 8],
            steps: [1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn round_trips_header_and_sections() {
        let encoded = sample_encoded();
        let mut buf = Vec::new();
        write_eb_file(&mut buf, &encoded).unwrap();
        let mut cursor = buf.as_slice();
        let decoded = read_eb_file(&mut cursor).unwrap();
        assert_eq!(decoded.vertex_count, 4);
        assert_eq!(decoded.history.len(), 4);
        assert_eq!(decoded.m_table.len(), 0);
        assert_eq!(decoded.residuals, encoded.residuals);
        assert_eq!(decoded.bits_per_axis, [8, 8, 8]);
    }

    #[test]
    fn rejects_bad_signature() {
        let buf = vec![0u8; 16];
        let mut cursor: &[u8] = &buf;
        assert!(matches!(
            read_eb_file(&mut cursor),
            Err(EbError::MalformedInput(_))
        ));
    }
}
