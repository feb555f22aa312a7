//! Extreme-value statistics collaborator.
//!
//! The engines hand a finished (support, tail-probability) curve plus a
//! walker count to an [`ExtremeValueStats`] implementor and get back the
//! variance of the maximum among that many independent walkers. The trait
//! is the seam: engines never hard-code the aggregation formula, so a
//! different order-statistic estimator can be swapped in without touching
//! evolution code.

use crate::error::{SimError, SimResult};
use crate::real::{real, to_f64, Real};

/// Variance aggregation over a monotone tail-probability curve.
///
/// # Contract
///
/// - `support` is an ordered sequence of lattice positions; spacing may be
///   non-uniform.
/// - `probabilities` matches `support` element for element, is monotone
///   non-increasing, and ends in 0 (a completed tail).
/// - `n_particles` is the notional number of independent walkers and must
///   be positive.
pub trait ExtremeValueStats {
    /// Returns the variance of the maximum among `n_particles` walkers.
    fn variance(
        &self,
        support: &[i64],
        probabilities: &[Real],
        n_particles: &Real,
    ) -> SimResult<Real>;

    /// Sequence overload: one variance per supplied particle count.
    fn variances(
        &self,
        support: &[i64],
        probabilities: &[Real],
        n_particles: &[Real],
    ) -> SimResult<Vec<Real>> {
        n_particles
            .iter()
            .map(|n| self.variance(support, probabilities, n))
            .collect()
    }
}

/// Gumbel-type variance of the maximum walker position.
///
/// Reads `probabilities[k]` as the tail probability G(x_k) of a single
/// walker, forms the max-order-statistic CDF (1 − G(x_k))^N and returns the
/// variance of the resulting discrete distribution.
///
/// The aggregation runs at double precision in log space (`ln_1p`/`exp`):
/// the extended precision of `Real` matters for evolving the recurrence,
/// while the aggregate moments are insensitive to it. Tail values below
/// f64 range collapse to a factor of exactly 1, which is the correct limit.
#[derive(Clone, Copy, Debug, Default)]
pub struct GumbelStats;

impl ExtremeValueStats for GumbelStats {
    fn variance(
        &self,
        support: &[i64],
        probabilities: &[Real],
        n_particles: &Real,
    ) -> SimResult<Real> {
        if support.len() != probabilities.len() {
            return Err(SimError::LengthMismatch {
                left: support.len(),
                right: probabilities.len(),
            });
        }
        if support.is_empty() {
            return Err(SimError::InvalidParameter {
                name: "support",
                value: "empty curve".to_string(),
            });
        }
        let n = to_f64(n_particles);
        if !(n > 0.0) {
            return Err(SimError::InvalidParameter {
                name: "n_particles",
                value: format!("{n_particles} (must be > 0)"),
            });
        }

        let mut mean = 0.0_f64;
        let mut second = 0.0_f64;
        let mut prev_cdf = 0.0_f64;
        for (&x, g) in support.iter().zip(probabilities.iter()) {
            let g = to_f64(g).clamp(0.0, 1.0);
            let cdf_max = if g <= 0.0 {
                1.0
            } else if g >= 1.0 {
                0.0
            } else {
                (n * (-g).ln_1p()).exp()
            };
            let weight = cdf_max - prev_cdf;
            if weight > 0.0 {
                let x = x as f64;
                mean += weight * x;
                second += weight * x * x;
            }
            prev_cdf = prev_cdf.max(cdf_max);
        }

        Ok(real((second - mean * mean).max(0.0)))
    }
}
