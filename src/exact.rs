//! Exact binary expansion of `f64` weights.
//!
//! A finite `f64` is always a dyadic rational `mantissa * 2^e`. Each weight
//! is decomposed exactly, every weight in a batch is rescaled to the same
//! power of two, and the results are summed and compared as plain integers.
//! No floating-point rounding is involved at any step.

use crate::digits::Digits;
use crate::error::{FldrError, Result};

const FRACTION_BITS: u32 = 52;
const EXPONENT_BIAS: i32 = 1075; // 1023 + FRACTION_BITS
const SUBNORMAL_EXPONENT: i32 = 1 - EXPONENT_BIAS;

/// A weight as `mantissa * 2^offset * 2^-exponent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactWeight {
    /// Integral mantissa; leading digit is 1.
    pub mantissa: Digits,
    /// Digits in `mantissa`.
    pub width: usize,
    /// Zero digits appended below the mantissa.
    pub offset: usize,
    /// Digits below the binary point.
    pub exponent: usize,
}

impl ExactWeight {
    /// Decompose a positive finite weight.
    ///
    /// The mantissa is the smallest integer `M` with `x = M * 2^e`. This is
    /// the integer reached by doubling a `[0.5, 1)` significand until it has
    /// no fractional part. It is read straight off the IEEE-754 fields.
    ///
    /// # Errors
    /// * [`FldrError::Domain`] for `NaN` and infinities.
    /// * [`FldrError::NonPositive`] for zero and negative weights.
    pub fn from_f64(x: f64) -> Result<Self> {
        if !x.is_finite() {
            return Err(FldrError::Domain { index: 0, value: x });
        }
        if x <= 0.0 {
            return Err(FldrError::NonPositive { index: 0, value: x });
        }

        let bits = x.to_bits();
        let biased = ((bits >> FRACTION_BITS) & 0x7ff) as i32;
        let fraction = bits & ((1u64 << FRACTION_BITS) - 1);
        let (raw, e) = if biased == 0 {
            (fraction, SUBNORMAL_EXPONENT)
        } else {
            (fraction | (1u64 << FRACTION_BITS), biased - EXPONENT_BIAS)
        };
        let tz = raw.trailing_zeros();
        let e = e + tz as i32;

        let mantissa = Digits::from_u64(raw >> tz);
        let width = mantissa.len();
        let (offset, exponent) = if e > 0 {
            (e as usize, 0)
        } else {
            (0, e.unsigned_abs() as usize)
        };

        Ok(Self {
            mantissa,
            width,
            offset,
            exponent,
        })
    }

    /// Bring every weight to the batch-wide maximum exponent, growing each
    /// `offset` to compensate. Returns that exponent.
    pub fn normalize(weights: &mut [ExactWeight]) -> usize {
        let max_exponent = weights.iter().map(|w| w.exponent).max().unwrap_or(0);
        for w in weights.iter_mut() {
            w.offset += max_exponent - w.exponent;
            w.exponent = max_exponent;
        }
        max_exponent
    }

    /// The weight at the common scale as integer digits: the mantissa
    /// followed by `offset` zeros.
    pub fn align(&self) -> Digits {
        let mut items = Vec::with_capacity(self.width + self.offset);
        items.extend_from_slice(self.mantissa.as_slice());
        items.resize(self.width + self.offset, 0);
        Digits::from_bits(items)
    }

    /// Decompose, normalize and align a whole batch.
    ///
    /// Returns the aligned digits and the common exponent `E`: weight `i` is
    /// exactly `aligned[i] / 2^E`.
    pub fn aligned_batch(weights: &[f64]) -> Result<(Vec<Digits>, usize)> {
        let mut exact = weights
            .iter()
            .enumerate()
            .map(|(i, &x)| ExactWeight::from_f64(x).map_err(|e| e.with_index(i)))
            .collect::<Result<Vec<_>>>()?;
        let scale = ExactWeight::normalize(&mut exact);
        Ok((exact.iter().map(ExactWeight::align).collect(), scale))
    }
}
