// Holds the number primitives the search is built on: the signed square root,
// the closeness check, and a high precision residual for checking results

/// `sign(v) * sqrt(|v|)`. Zero maps to zero and keeps its sign bit.
pub fn signed_sqrt(value: f64) -> f64 {
    value.abs().sqrt().copysign(value)
}

/// Approximate equality with a relative and an absolute bound, the same rule
/// as `|a - b| <= max(relative * max(|a|, |b|), absolute)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Tolerance {
    pub const fn new(relative: f64, absolute: f64) -> Self {
        Tolerance { relative, absolute }
    }

    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let diff = (a - b).abs();
        diff <= (self.relative * b.abs()) || diff <= (self.relative * a.abs()) || diff <= self.absolute
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::new(1e-9, 0.0)
    }
}

pub mod precise {
    use bigdecimal::BigDecimal;
    use num_traits::{FromPrimitive, ToPrimitive};

    /// Signed square root of an integer square, carried at `BigDecimal`'s default precision
    pub fn signed_sqrt(square: i64) -> Option<BigDecimal> {
        let root = BigDecimal::from_i64(square.checked_abs()?)?.sqrt()?;
        if square < 0 {
            Some(-root)
        } else {
            Some(root)
        }
    }

    /// `|ssqrt(a2) + ssqrt(b2) - target|`, evaluated without the rounding the
    /// f64 search goes through. `None` for a non-finite target.
    pub fn residual(a2: i64, b2: i64, target: f64) -> Option<f64> {
        let target = BigDecimal::from_f64(target)?;
        let sum = signed_sqrt(a2)? + signed_sqrt(b2)?;
        (sum - target).abs().to_f64()
    }
}
