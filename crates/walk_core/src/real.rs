//! Extended-precision numeric alias used throughout the simulation.
//!
//! Deep-tail probabilities shrink geometrically with every time step, so the
//! recurrence engines carry their arrays at a significand width well beyond
//! f64. All arithmetic is written against the [`Real`] alias and the helpers
//! in this module; nothing outside this file names the backing crate, so the
//! representation can be swapped without touching engine code.
//!
//! The backing type is [`dashu_float::FBig`], a pure-Rust binary big float.
//! Every value produced by the constructors here carries [`PRECISION`] bits
//! of significand (128, above the 113-bit floor needed for long horizons),
//! and arithmetic between such values stays at that precision. The exponent
//! is unbounded, so tail entries only reach exactly 0 by rounding, which is
//! expected steady-state behaviour and never an error.

use dashu_float::FBig;

/// Extended-precision scalar carried by every probability and mass array.
pub type Real = FBig;

/// Significand width, in bits, of every [`Real`] built by this module.
pub const PRECISION: usize = 128;

/// The additive identity at working precision.
#[inline]
pub fn zero() -> Real {
    FBig::ZERO.with_precision(PRECISION).value()
}

/// The multiplicative identity at working precision.
#[inline]
pub fn one() -> Real {
    FBig::ONE.with_precision(PRECISION).value()
}

/// Lifts an `f64` (a bias draw, a cutoff, a particle count) to [`Real`].
///
/// Non-finite inputs map to zero; call sites validate their parameters
/// before lifting them.
#[inline]
pub fn real(value: f64) -> Real {
    FBig::try_from(value)
        .unwrap_or(FBig::ZERO)
        .with_precision(PRECISION)
        .value()
}

/// Lifts an unsigned count (a binomial draw) to [`Real`].
#[inline]
pub fn real_from_u64(value: u64) -> Real {
    FBig::from(value).with_precision(PRECISION).value()
}

/// Lifts a signed lattice position to [`Real`].
#[inline]
pub fn real_from_i64(value: i64) -> Real {
    FBig::from(value).with_precision(PRECISION).value()
}

/// Rounds a [`Real`] back down to `f64`, for reporting and regime checks.
///
/// Values far below f64 range collapse to 0 and values above it to ±∞; the
/// call sites only use the result for coarse threshold comparisons and
/// statistics, never to continue the recurrence.
#[inline]
pub fn to_f64(value: &Real) -> f64 {
    value.to_f64().value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_f64() {
        let x = real(0.375);
        assert_eq!(to_f64(&x), 0.375);
    }

    #[test]
    fn test_identities() {
        assert_eq!(to_f64(&zero()), 0.0);
        assert_eq!(to_f64(&one()), 1.0);
        assert_eq!(zero() + one(), one());
    }

    #[test]
    fn test_significand_wider_than_f64() {
        // 1 + 1e-30 is indistinguishable from 1 at f64 precision but not here.
        let tiny = real(1e-30);
        let sum = one() + &tiny;
        assert!(sum > one());
    }

    #[test]
    fn test_integer_lifts() {
        assert_eq!(to_f64(&real_from_u64(1000)), 1000.0);
        assert_eq!(to_f64(&real_from_i64(-7)), -7.0);
    }

    #[test]
    fn test_geometric_decay_survives_f64_underflow() {
        // 2^-1200 underflows f64 (min positive subnormal ~5e-324) but must
        // stay nonzero here; long-horizon tails rely on this headroom.
        let half = real(0.5);
        let mut p = one();
        for _ in 0..1200 {
            p = p * &half;
        }
        assert!(p > zero());
        assert_eq!(to_f64(&p), 0.0);
    }

    #[test]
    fn test_division_matches_inverse() {
        let q = real(4.0);
        let inv = one() / &q;
        assert_eq!(to_f64(&inv), 0.25);
    }
}
