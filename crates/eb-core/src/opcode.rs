//! The seven Edgebreaker triangle types, the reduced 5-symbol alphabet the
//! three prefix codes operate on, and the opcode-history bit string
//! encode/decode (spec §4.5 "History emission", §4.6 "Initialization").
//!
//! `M` and `H` are never written to the bit string directly: both are
//! substituted by `S` before coding (the rarer hole/handle information is
//! instead carried by the shorter auxiliary tables), and the decoder's
//! disambiguation pre-pass recovers them by replaying the M/H tables
//! against the per-`S` skip counters. Keeping one seven-variant enum plus a
//! reduction helper (rather than two separate enums) matches
//! `mesh_edgebreaker_shared.rs`'s small-shared-enum shape in the teacher.

use crate::bit_stream::{BitReader, BitWriter};
use crate::error::{EbError, EbResult};
use std::io::{Read, Write};

/// One of the seven triangle types the traversal can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleType {
    C,
    L,
    E,
    R,
    S,
    M,
    H,
}

/// The 5-symbol alphabet the prefix codes are built over; `M`/`H` reduce to
/// `S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReducedSymbol {
    C,
    L,
    E,
    R,
    S,
}

impl TriangleType {
    pub fn reduce(self) -> ReducedSymbol {
        match self {
            TriangleType::C => ReducedSymbol::C,
            TriangleType::L => ReducedSymbol::L,
            TriangleType::E => ReducedSymbol::E,
            TriangleType::R => ReducedSymbol::R,
            TriangleType::S | TriangleType::M | TriangleType::H => ReducedSymbol::S,
        }
    }
}

/// One of the three fixed prefix-code tables of spec §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSeries {
    One = 1,
    Two = 2,
    Three = 3,
}

impl CodeSeries {
    pub fn from_u32(v: u32) -> EbResult<Self> {
        match v {
            1 => Ok(CodeSeries::One),
            2 => Ok(CodeSeries::Two),
            3 => Ok(CodeSeries::Three),
            other => Err(EbError::MalformedInput(format!(
                "code series selector must be in {{1,2,3}}, got {other}"
            ))),
        }
    }

    /// `(codeword, bit length)` for `sym` given whether the previous symbol
    /// in the history was `C`.
    fn codeword(self, prev_is_c: bool, sym: ReducedSymbol) -> (u32, u32) {
        use ReducedSymbol::*;
        if prev_is_c {
            // All three series share the same short "after C" table.
            return match sym {
                C => (0b0, 1),
                S => (0b10, 2),
                R => (0b11, 2),
                L | E => unreachable!(
                    "an L or E triangle can never immediately follow a C triangle"
                ),
            };
        }
        match self {
            CodeSeries::One => match sym {
                C => (0b0, 1),
                S => (0b100, 3),
                R => (0b101, 3),
                L => (0b110, 3),
                E => (0b111, 3),
            },
            CodeSeries::Two => match sym {
                C => (0b00, 2),
                S => (0b111, 3),
                R => (0b10, 2),
                L => (0b110, 3),
                E => (0b01, 2),
            },
            CodeSeries::Three => match sym {
                C => (0b00, 2),
                S => (0b010, 3),
                R => (0b011, 3),
                L => (0b10, 2),
                E => (0b11, 2),
            },
        }
    }

    /// Reads one symbol from `reader` given the running "previous was C"
    /// state, walking the series' prefix tree bit by bit.
    fn read_symbol<R: Read>(
        self,
        reader: &mut BitReader<R>,
        prev_is_c: bool,
    ) -> EbResult<ReducedSymbol> {
        use ReducedSymbol::*;
        if prev_is_c {
            return Ok(if reader.get_bits(1)? == 0 {
                C
            } else if reader.get_bits(1)? == 0 {
                S
            } else {
                R
            });
        }
        // Walk the non-"after C" table bit by bit; each series below is a
        // small literal prefix tree matching `codeword` above.
        match self {
            CodeSeries::One => {
                if reader.get_bits(1)? == 0 {
                    return Ok(C);
                }
                let rest = reader.get_bits(2)?;
                Ok(match rest {
                    0b00 => S,
                    0b01 => R,
                    0b10 => L,
                    _ => E,
                })
            }
            CodeSeries::Two => {
                if reader.get_bits(1)? == 0 {
                    return Ok(if reader.get_bits(1)? == 0 { C } else { E });
                }
                if reader.get_bits(1)? == 0 {
                    return Ok(R);
                }
                Ok(if reader.get_bits(1)? == 0 { L } else { S })
            }
            CodeSeries::Three => {
                if reader.get_bits(1)? == 0 {
                    return Ok(if reader.get_bits(1)? == 0 { C } else { L });
                }
                if reader.get_bits(1)? == 0 {
                    return Ok(if reader.get_bits(1)? == 0 { S } else { R });
                }
                Ok(E)
            }
        }
    }
}

/// Counts each reduced symbol's occurrences split by whether the preceding
/// symbol was `C`, then returns the series with the fewest total bits
/// (ties broken `1 < 2 < 3`).
pub fn choose_code_series(history: &[TriangleType]) -> CodeSeries {
    let candidates = [CodeSeries::One, CodeSeries::Two, CodeSeries::Three];
    let mut best = CodeSeries::One;
    let mut best_bits = u64::MAX;
    for series in candidates {
        let bits = encoded_bit_length(history, series);
        if bits < best_bits {
            best_bits = bits;
            best = series;
        }
    }
    best
}

/// The exact number of bits [`write_history`] will emit for `history`
/// under `series`, computed without touching a bit stream. The container
/// needs this up front: `H_len` is a header field written before the
/// history bits themselves.
pub fn history_bit_length(history: &[TriangleType], series: CodeSeries) -> u64 {
    encoded_bit_length(history, series)
}

fn encoded_bit_length(history: &[TriangleType], series: CodeSeries) -> u64 {
    let mut bits = 0u64;
    let mut prev_is_c = false;
    for &t in history {
        let sym = t.reduce();
        let (_, len) = series.codeword(prev_is_c, sym);
        bits += len as u64;
        prev_is_c = matches!(sym, ReducedSymbol::C);
    }
    bits
}

/// Writes the opcode history under `series`, returning the number of bits
/// written (the `H_len` header field).
pub fn write_history<W: Write>(
    writer: &mut BitWriter<W>,
    history: &[TriangleType],
    series: CodeSeries,
) -> EbResult<u64> {
    let start = writer.bit_count();
    let mut prev_is_c = false;
    for &t in history {
        let sym = t.reduce();
        let (code, len) = series.codeword(prev_is_c, sym);
        writer.put_bits(code, len)?;
        prev_is_c = matches!(sym, ReducedSymbol::C);
    }
    Ok(writer.bit_count() - start)
}

/// Reads reduced symbols under `series` from a bit string of exactly
/// `h_len` bits. There is no explicit face-count header field (spec
/// §6.1): the face count *is* the number of symbols that fit in `h_len`
/// bits, so decoding continues until the running bit count reaches
/// `h_len` rather than a pre-known symbol count.
pub fn read_history<R: Read>(
    reader: &mut BitReader<R>,
    series: CodeSeries,
    h_len: u64,
) -> EbResult<Vec<ReducedSymbol>> {
    let start = reader.bit_count();
    let mut out = Vec::new();
    let mut prev_is_c = false;
    while reader.bit_count() - start < h_len {
        let sym = series.read_symbol(reader, prev_is_c)?;
        prev_is_c = matches!(sym, ReducedSymbol::C);
        out.push(sym);
    }
    if reader.bit_count() - start != h_len {
        return Err(EbError::MalformedInput(
            "opcode history did not end on the declared bit length".into(),
        ));
    }
    Ok(out)
}
