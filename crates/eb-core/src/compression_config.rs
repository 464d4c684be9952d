//! Public configuration accepted by [`crate::encoder::Encoder`].
//!
//! Mirrors the encoder input contract of spec §6.2: a quantization step and
//! a bit-width budget per axis, both supplied by the caller (the CLI or
//! embedding application), not derived by the core itself.

use crate::error::{EbError, EbResult};
use crate::quantization::QuantizationStep;

/// Per-axis quantization step sizes and bit-width budgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionOptions {
    /// Real-valued quantization step per axis (x, y, z). Each must be a
    /// positive finite number.
    pub steps: [f64; 3],
    /// Bit-width budget per axis, each `>= 2`; quantized coordinates must
    /// satisfy `|q| < 2^(bits - 2)`.
    pub bits: [u32; 3],
}

impl CompressionOptions {
    /// Builds options from per-axis steps and a single bit width applied to
    /// all three axes.
    pub fn uniform(step: f64, bits: u32) -> EbResult<Self> {
        Self::new([step, step, step], [bits, bits, bits])
    }

    /// Builds options from explicit per-axis steps and bit widths.
    pub fn new(steps: [f64; 3], bits: [u32; 3]) -> EbResult<Self> {
        for b in bits {
            if b < 2 {
                return Err(EbError::InvalidArgument(format!(
                    "axis bit width must be >= 2, got {b}"
                )));
            }
        }
        for s in steps {
            if !s.is_finite() || s <= 0.0 {
                return Err(EbError::InvalidArgument(format!(
                    "quantization step must be a positive finite number, got {s}"
                )));
            }
        }
        Ok(Self { steps, bits })
    }

    /// The persisted `(coef, exp)` pair for each axis's step size.
    pub fn quantization_steps(&self) -> EbResult<[QuantizationStep; 3]> {
        Ok([
            QuantizationStep::from_step(self.steps[0])?,
            QuantizationStep::from_step(self.steps[1])?,
            QuantizationStep::from_step(self.steps[2])?,
        ])
    }
}

impl Default for CompressionOptions {
    /// A uniform step of `0.01` and a 14-bit per-axis budget: generous
    /// headroom for typical meshes while leaving the `b_axis - 2` margin
    /// spec §3 requires.
    fn default() -> Self {
        Self::uniform(0.01, 14).expect("default compression options are always valid")
    }
}
