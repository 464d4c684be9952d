//! Coordinate quantization and the bit-exact `(coef, exp)` step-size
//! representation persisted in the EB header.
//!
//! A quantization step `step = coef * 2^(-exp)` is derived by normalizing
//! `step` into `[1, 2)`, so that `coef = floor(normalized * 2^29)` fits in
//! 30 bits; re-deriving `step` from the stored `(coef, exp)` on decode is
//! therefore exact, and re-quantizing a decoded mesh with the same step
//! reproduces a bit-identical EB file (invariant 7 of the codec's testable
//! properties).

use crate::error::{EbError, EbResult};

const COEF_BITS: u32 = 30;
const COEF_SHIFT: i32 = 29;

/// A quantization step size persisted as `coef * 2^(-exp)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizationStep {
    /// `1 <= coef < 2^30`.
    pub coef: u32,
    /// Non-negative signum: `true` means the step itself is non-negative
    /// (steps are always positive in practice, but the header's sign slot
    /// is carried through unconditionally per the container layout).
    pub non_negative: bool,
    /// Number of bits `coef` must be shifted to reconstruct the step.
    pub exp: u32,
}

impl QuantizationStep {
    /// Derives the `(coef, exp)` pair for a positive real step size.
    pub fn from_step(step: f64) -> EbResult<Self> {
        if !(step.is_finite()) || step <= 0.0 {
            return Err(EbError::InvalidArgument(format!(
                "quantization step must be a positive finite number, got {step}"
            )));
        }

        let mut coord = step;
        let mut count: i32 = 0;
        while coord >= 2.0 {
            coord /= 2.0;
            count += 1;
        }
        while coord < 1.0 {
            coord *= 2.0;
            count -= 1;
        }

        let coef = (coord * (1u64 << COEF_SHIFT) as f64).floor() as i64;
        let coef = coef.clamp(1, (1i64 << COEF_BITS) - 1) as u32;
        if coef >= (1 << COEF_BITS) {
            return Err(EbError::Overflow(
                "quantization step coefficient exceeds 30 bits".into(),
            ));
        }

        let exp = count + COEF_SHIFT;
        if exp < 0 {
            return Err(EbError::Overflow(
                "quantization step exponent is negative".into(),
            ));
        }

        Ok(Self {
            coef,
            non_negative: true,
            exp: exp as u32,
        })
    }

    /// Reconstructs `step = coef * 2^(-exp)` from the persisted fields.
    pub fn to_step(self) -> f64 {
        self.coef as f64 * 2f64.powi(-(self.exp as i32))
    }
}

/// Quantizes a real coordinate: `signum(p) * floor(|p| / step + 0.5)`.
///
/// Fails with [`EbError::Overflow`] if the resulting index does not fit in
/// the per-axis bit budget (`|q| < 2^(bits - 2)`).
pub fn quantize_axis(value: f64, step: f64, bits: u32) -> EbResult<i64> {
    let magnitude = (value.abs() / step + 0.5).floor();
    let q = if value < 0.0 {
        -(magnitude as i64)
    } else {
        magnitude as i64
    };
    let limit = 1i64 << (bits - 2);
    if q.abs() >= limit {
        return Err(EbError::Overflow(format!(
            "quantized coordinate {q} exceeds the {bits}-bit axis budget"
        )));
    }
    Ok(q)
}

/// Reconstructs a real coordinate from its quantized index.
pub fn dequantize_axis(q: i64, step: f64) -> f64 {
    if step == 1.0 {
        q as f64
    } else {
        q as f64 * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_round_trips_through_coef_exp() {
        for step in [1.0, 0.01, 0.001, 123.456, 3.0, 0.5] {
            let qs = QuantizationStep::from_step(step).unwrap();
            assert!(qs.coef >= 1 && qs.coef < (1 << COEF_BITS));
            let recovered = qs.to_step();
            assert!(
                (recovered - step).abs() / step < 1e-8,
                "step {step} recovered as {recovered}"
            );
        }
    }

    #[test]
    fn rejects_non_positive_step() {
        assert!(QuantizationStep::from_step(0.0).is_err());
        assert!(QuantizationStep::from_step(-1.0).is_err());
    }

    #[test]
    fn quantize_then_dequantize_matches_rounding_rule() {
        let step = 0.01;
        let q = quantize_axis(1.2345, step, 16).unwrap();
        assert_eq!(q, (1.2345f64 / step + 0.5).floor() as i64);
        let back = dequantize_axis(q, step);
        assert!((back - 1.23).abs() < 1e-6);
    }

    #[test]
    fn quantize_negative_values_uses_signum() {
        let step = 1.0;
        assert_eq!(quantize_axis(-2.6, step, 16).unwrap(), -3);
        assert_eq!(quantize_axis(2.6, step, 16).unwrap(), 3);
    }

    #[test]
    fn overflow_is_detected() {
        // 4-bit budget allows |q| < 2^2 = 4.
        assert!(quantize_axis(10.0, 1.0, 4).is_err());
        assert!(quantize_axis(3.0, 1.0, 4).is_ok());
    }

    #[test]
    fn step_of_one_skips_the_multiply() {
        assert_eq!(dequantize_axis(7, 1.0), 7.0);
    }
}
