//! Context-selector binarizer for the arithmetic coder.
//!
//! Maps an integer value of known bit width `n` into a sequence of
//! `(context_id, bit)` pairs: the top `n - f` levels walk a linear chain
//! (one context per level), the bottom `f` levels walk a complete binary
//! tree over `2^f - 1` interior nodes. Once a `1` bit is emitted at or past
//! the boundary between the linear chain and the full tree, the selector
//! drops into bypass mode (`context_id == 0`, surfaced as context `-1`) for
//! the remaining bits — callers must keep feeding bits so the encoder and
//! decoder's selector instances stay in lock-step even while bypassed.

use crate::error::{EbError, EbResult};

/// Binarizer state shared verbatim between an encoder and a decoder driving
/// the same value.
#[derive(Debug, Clone, Copy)]
pub struct ContextSelector {
    n_bits: u32,
    f_levels: u32,
    delta: i64,
    context_id: i64,
    encoded_so_far: u32,
}

impl ContextSelector {
    /// Creates a selector for an `n`-bit value with `f` full-tree levels.
    ///
    /// `f` must be in `[1, n]`.
    pub fn new(n_bits: u32, f_levels: u32) -> EbResult<Self> {
        if f_levels < 1 || f_levels > n_bits {
            return Err(EbError::InvalidArgument(format!(
                "context selector: f_levels must be in [1,{n_bits}], got {f_levels}"
            )));
        }

        let (context_id, delta) = if n_bits == f_levels {
            let context_id = 1i64 << (n_bits - 1);
            (context_id, context_id / 2)
        } else {
            let context_id = (1i64 << f_levels) + n_bits as i64 - f_levels as i64 - 1;
            let delta = if n_bits - f_levels == 1 {
                context_id / 2
            } else {
                1
            };
            (context_id, delta)
        };

        Ok(Self {
            n_bits,
            f_levels,
            delta,
            context_id,
            // `Context_selector`'s constructor ends with `++encode_bits`, so
            // the bypass test below (`n - f >= encoded_so_far`) is checked
            // against a counter that already counts the value's first bit
            // as "in progress", not yet fully encoded. Starting at 0 would
            // fire bypass one bit too early — e.g. a pure full tree
            // (n == f) must never bypass, but a leading `1` would trip it.
            encoded_so_far: 1,
        })
    }

    /// The number of distinct context ids used to encode an `n`-bit value
    /// under `f` full-tree levels: `2^f + n - f - 1`.
    pub fn total_contexts(n_bits: u32, f_levels: u32) -> u32 {
        (1u32 << f_levels) + n_bits - f_levels - 1
    }

    /// The context id to use for the next bit. `-1` means bypass mode.
    pub fn get_context(&self) -> i64 {
        self.context_id - 1
    }

    /// Advances the selector's state past one bit of the value.
    ///
    /// `bit` must be 0 or 1. Must be called exactly `n` times per value,
    /// even once bypassed, to keep encoder and decoder instances in step.
    pub fn feed_bit(&mut self, bit: u32) -> EbResult<()> {
        if bit > 1 {
            return Err(EbError::InvalidArgument(format!(
                "context selector bit must be 0 or 1, got {bit}"
            )));
        }

        if self.context_id != 0 {
            if bit == 0 {
                self.context_id -= self.delta;
            } else {
                self.context_id += self.delta;
                if self.n_bits as i64 - self.f_levels as i64 >= self.encoded_so_far as i64 {
                    self.context_id = 0;
                }
            }

            if self.delta != 1 {
                self.delta /= 2;
            } else if self.context_id == (1i64 << self.f_levels) {
                self.delta = self.context_id / 2;
            } else {
                self.delta = 1;
            }
        }

        self.encoded_so_far += 1;
        Ok(())
    }
}
