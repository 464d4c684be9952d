//! Binary arithmetic coder with adaptive per-context frequencies.
//!
//! A classic bit-oriented arithmetic coder (low/high interval, E1/E2/E3
//! renormalization with a pending-bit counter for the underflow case)
//! rather than a byte-oriented range coder, so that [`ArithmeticEncoder::terminate`]
//! can flush the minimum number of bits needed to disambiguate the final
//! interval. The interval is tracked with 32 significant bits in 64-bit
//! registers so that `range * freq` never overflows before the division.
//!
//! Each context models a single binary source with two adaptive frequency
//! counters, rescaled (halved, floor 1) before they would cross the
//! configured maximum total so the model stays bounded and numerically
//! exact.

use std::io::{Read, Write};

use crate::bit_stream::{BitReader, BitWriter};
use crate::error::{EbError, EbResult};

/// Default cap on a context's total frequency before it is rescaled.
pub const DEFAULT_MAX_FREQUENCY: u32 = (1 << 30) - 1;

const CODE_BITS: u32 = 32;
const TOP_VALUE: u64 = (1u64 << CODE_BITS) - 1;
const FIRST_QTR: u64 = (TOP_VALUE >> 2) + 1;
const HALF: u64 = 2 * FIRST_QTR;
const THIRD_QTR: u64 = 3 * FIRST_QTR;

/// A single adaptive binary context: two frequency counters and whether
/// they still adapt on use.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    freq0: u32,
    freq1: u32,
    adaptive: bool,
    max_freq: u32,
}

impl Context {
    /// A fresh, equiprobable, adaptive context.
    pub fn new(max_freq: u32) -> Self {
        Self {
            freq0: 1,
            freq1: 1,
            adaptive: true,
            max_freq,
        }
    }

    /// Freezes the context's counters: `update` becomes a no-op.
    pub fn set_adaptive(&mut self, adaptive: bool) {
        self.adaptive = adaptive;
    }

    fn total(&self) -> u32 {
        self.freq0 + self.freq1
    }

    fn update(&mut self, bit: u32) {
        if !self.adaptive {
            return;
        }
        if self.total() + 1 >= self.max_freq {
            self.freq0 = (self.freq0 / 2).max(1);
            self.freq1 = (self.freq1 / 2).max(1);
        }
        if bit == 0 {
            self.freq0 += 1;
        } else {
            self.freq1 += 1;
        }
    }
}

fn split_point(low: u64, range: u64, freq0: u64, total: u64) -> u64 {
    low + (range * freq0) / total
}

/// Encodes a sequence of context-routed and bypass bits into a bit stream.
pub struct ArithmeticEncoder<'a, W: Write> {
    writer: BitWriter<'a, W>,
    low: u64,
    high: u64,
    pending_bits: u64,
    contexts: Vec<Context>,
}

impl<'a, W: Write> ArithmeticEncoder<'a, W> {
    /// Creates an encoder with `num_contexts` freshly initialized contexts,
    /// writing to `sink`.
    pub fn new(sink: &'a mut W, num_contexts: usize, max_freq: u32) -> Self {
        Self {
            writer: BitWriter::new(sink),
            low: 0,
            high: TOP_VALUE,
            pending_bits: 0,
            contexts: vec![Context::new(max_freq); num_contexts],
        }
    }

    /// Direct access to a context, e.g. to freeze its adaptivity.
    pub fn context_mut(&mut self, ctx_id: usize) -> Option<&mut Context> {
        self.contexts.get_mut(ctx_id)
    }

    /// Resets the coding interval. Writes no bits by itself.
    pub fn start(&mut self) {
        self.low = 0;
        self.high = TOP_VALUE;
        self.pending_bits = 0;
    }

    fn output_bit_plus_pending(&mut self, bit: u32) -> EbResult<()> {
        self.writer.put_bits(bit, 1)?;
        for _ in 0..self.pending_bits {
            self.writer.put_bits(1 - bit, 1)?;
        }
        self.pending_bits = 0;
        Ok(())
    }

    fn renormalize(&mut self) -> EbResult<()> {
        loop {
            if self.high < HALF {
                self.output_bit_plus_pending(0)?;
            } else if self.low >= HALF {
                self.output_bit_plus_pending(1)?;
                self.low -= HALF;
                self.high -= HALF;
            } else if self.low >= FIRST_QTR && self.high < THIRD_QTR {
                self.pending_bits += 1;
                self.low -= FIRST_QTR;
                self.high -= FIRST_QTR;
            } else {
                break;
            }
            self.low *= 2;
            self.high = 2 * self.high + 1;
        }
        Ok(())
    }

    /// Encodes `bit` using context `ctx_id`'s current frequencies, then
    /// updates that context.
    pub fn encode_regular(&mut self, ctx_id: usize, bit: u32) -> EbResult<()> {
        if bit > 1 {
            return Err(EbError::InvalidArgument(format!(
                "encode_regular bit must be 0 or 1, got {bit}"
            )));
        }
        let ctx = self
            .contexts
            .get(ctx_id)
            .ok_or_else(|| EbError::InvalidArgument(format!("unknown context id {ctx_id}")))?;
        let total = ctx.total() as u64;
        let freq0 = ctx.freq0 as u64;
        let range = self.high - self.low + 1;
        let mid = split_point(self.low, range, freq0, total);

        if bit == 0 {
            self.high = mid - 1;
        } else {
            self.low = mid;
        }
        self.contexts[ctx_id].update(bit);
        self.renormalize()
    }

    /// Encodes `bit` assuming both symbols are equiprobable; does not touch
    /// any context's frequencies.
    pub fn encode_bypass(&mut self, bit: u32) -> EbResult<()> {
        if bit > 1 {
            return Err(EbError::InvalidArgument(format!(
                "encode_bypass bit must be 0 or 1, got {bit}"
            )));
        }
        let range = self.high - self.low + 1;
        let half = range / 2;
        if bit == 0 {
            self.high = self.low + half - 1;
        } else {
            self.low += half;
        }
        self.renormalize()
    }

    /// Flushes the minimum number of bits needed to disambiguate the final
    /// interval. Byte alignment of the underlying stream is the caller's
    /// responsibility.
    pub fn terminate(&mut self) -> EbResult<()> {
        self.pending_bits += 1;
        if self.low < FIRST_QTR {
            self.output_bit_plus_pending(0)
        } else {
            self.output_bit_plus_pending(1)
        }
    }

    /// Pads the underlying bit stream to the next byte boundary. Callers
    /// should call this once after [`Self::terminate`].
    pub fn align(&mut self) -> EbResult<()> {
        self.writer.align()
    }
}

/// Decodes a sequence of context-routed and bypass bits from a bit stream.
pub struct ArithmeticDecoder<'a, R: Read> {
    reader: BitReader<'a, R>,
    low: u64,
    high: u64,
    value: u64,
    contexts: Vec<Context>,
}

impl<'a, R: Read> ArithmeticDecoder<'a, R> {
    /// Creates a decoder with `num_contexts` freshly initialized contexts,
    /// reading from `source`.
    pub fn new(source: &'a mut R, num_contexts: usize, max_freq: u32) -> Self {
        Self {
            reader: BitReader::new(source),
            low: 0,
            high: TOP_VALUE,
            value: 0,
            contexts: vec![Context::new(max_freq); num_contexts],
        }
    }

    /// Direct access to a context, e.g. to freeze its adaptivity.
    pub fn context_mut(&mut self, ctx_id: usize) -> Option<&mut Context> {
        self.contexts.get_mut(ctx_id)
    }

    /// Resets the coding interval and pulls the initial code value.
    pub fn start(&mut self) -> EbResult<()> {
        self.low = 0;
        self.high = TOP_VALUE;
        self.value = self.reader.get_bits(CODE_BITS)? as u64;
        Ok(())
    }

    fn renormalize(&mut self) -> EbResult<()> {
        loop {
            if self.high < HALF {
                // no-op, matches encoder's output_bit_plus_pending(0) branch
            } else if self.low >= HALF {
                self.low -= HALF;
                self.high -= HALF;
                self.value -= HALF;
            } else if self.low >= FIRST_QTR && self.high < THIRD_QTR {
                self.low -= FIRST_QTR;
                self.high -= FIRST_QTR;
                self.value -= FIRST_QTR;
            } else {
                break;
            }
            self.low *= 2;
            self.high = 2 * self.high + 1;
            self.value = 2 * self.value + self.reader.get_bits(1)? as u64;
        }
        Ok(())
    }

    /// Decodes the next bit using context `ctx_id`'s current frequencies,
    /// then updates that context.
    pub fn decode_regular(&mut self, ctx_id: usize) -> EbResult<u32> {
        let ctx = self
            .contexts
            .get(ctx_id)
            .ok_or_else(|| EbError::InvalidArgument(format!("unknown context id {ctx_id}")))?;
        let total = ctx.total() as u64;
        let freq0 = ctx.freq0 as u64;
        let range = self.high - self.low + 1;
        let mid = split_point(self.low, range, freq0, total);

        let bit = if self.value < mid { 0 } else { 1 };
        if bit == 0 {
            self.high = mid - 1;
        } else {
            self.low = mid;
        }
        self.contexts[ctx_id].update(bit);
        self.renormalize()?;
        Ok(bit)
    }

    /// Decodes the next bit assuming both symbols are equiprobable.
    pub fn decode_bypass(&mut self) -> EbResult<u32> {
        let range = self.high - self.low + 1;
        let half = range / 2;
        let mid = self.low + half;
        let bit = if self.value < mid { 0 } else { 1 };
        if bit == 0 {
            self.high = mid - 1;
        } else {
            self.low = mid;
        }
        self.renormalize()?;
        Ok(bit)
    }

    /// Consumes the tail written by [`ArithmeticEncoder::terminate`]. The
    /// renormalization loop already consumed exactly the bits the encoder
    /// wrote, so this is a no-op kept for symmetry with the encoder's API.
    pub fn terminate(&mut self) -> EbResult<()> {
        Ok(())
    }

    /// Discards the remainder of the current byte, mirroring the
    /// encoder's trailing [`ArithmeticEncoder::align`].
    pub fn align(&mut self) {
        self.reader.align()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_context_round_trips_s6_sequence() {
        // Scenario S6: encoding then decoding [0,1,0,0,1,1,1,0] under a
        // single adaptive context reproduces the same sequence.
        let bits = [0u32, 1, 0, 0, 1, 1, 1, 0];
        let mut buf = Vec::new();
        {
            let mut enc = ArithmeticEncoder::new(&mut buf, 1, DEFAULT_MAX_FREQUENCY);
            enc.start();
            for &b in &bits {
                enc.encode_regular(0, b).unwrap();
            }
            enc.terminate().unwrap();
            enc.writer.align().unwrap();
        }

        let mut cursor = buf.as_slice();
        let mut dec = ArithmeticDecoder::new(&mut cursor, 1, DEFAULT_MAX_FREQUENCY);
        dec.start().unwrap();
        let mut decoded = Vec::new();
        for _ in 0..bits.len() {
            decoded.push(dec.decode_regular(0).unwrap());
        }
        assert_eq!(decoded, bits);
    }

    #[test]
    fn bypass_bits_round_trip() {
        let bits = [1u32, 0, 1, 1, 0, 0, 1, 0, 1, 1];
        let mut buf = Vec::new();
        {
            let mut enc = ArithmeticEncoder::new(&mut buf, 0, DEFAULT_MAX_FREQUENCY);
            enc.start();
            for &b in &bits {
                enc.encode_bypass(b).unwrap();
            }
            enc.terminate().unwrap();
            enc.writer.align().unwrap();
        }
        let mut cursor = buf.as_slice();
        let mut dec = ArithmeticDecoder::new(&mut cursor, 0, DEFAULT_MAX_FREQUENCY);
        dec.start().unwrap();
        let decoded: Vec<u32> = (0..bits.len()).map(|_| dec.decode_bypass().unwrap()).collect();
        assert_eq!(decoded, bits);
    }

    #[test]
    fn mixed_contexts_and_bypass_round_trip_many_symbols() {
        // A longer, pseudo-random-but-deterministic bitstream through 4
        // contexts plus bypass, verifying encode/decode order agreement.
        let mut rng_state: u32 = 0x1234_5678;
        let mut next = || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 17;
            rng_state ^= rng_state << 5;
            rng_state
        };
        let plan: Vec<(Option<usize>, u32)> = (0..500)
            .map(|_| {
                let r = next();
                let bit = r & 1;
                let ctx = (r >> 1) % 5;
                if ctx == 4 {
                    (None, bit)
                } else {
                    (Some(ctx as usize), bit)
                }
            })
            .collect();

        let mut buf = Vec::new();
        {
            let mut enc = ArithmeticEncoder::new(&mut buf, 4, DEFAULT_MAX_FREQUENCY);
            enc.start();
            for &(ctx, bit) in &plan {
                match ctx {
                    Some(c) => enc.encode_regular(c, bit).unwrap(),
                    None => enc.encode_bypass(bit).unwrap(),
                }
            }
            enc.terminate().unwrap();
            enc.writer.align().unwrap();
        }

        let mut cursor = buf.as_slice();
        let mut dec = ArithmeticDecoder::new(&mut cursor, 4, DEFAULT_MAX_FREQUENCY);
        dec.start().unwrap();
        for &(ctx, expected) in &plan {
            let got = match ctx {
                Some(c) => dec.decode_regular(c).unwrap(),
                None => dec.decode_bypass().unwrap(),
            };
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn rejects_non_binary_bypass_input() {
        let mut buf = Vec::new();
        let mut enc = ArithmeticEncoder::new(&mut buf, 0, DEFAULT_MAX_FREQUENCY);
        enc.start();
        assert!(matches!(enc.encode_bypass(2), Err(EbError::InvalidArgument(_))));
    }
}
