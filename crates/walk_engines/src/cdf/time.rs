//! Snapshot view of the CDF recurrence.

use walk_core::error::{SimError, SimResult};
use walk_core::real::Real;
use walk_core::stats::ExtremeValueStats;

use super::config::TimeCdfConfig;
use super::recurrence::CdfRecurrence;
use crate::bias::BiasSource;

/// Time-evolution engine over the cumulative tail recurrence.
///
/// Owns a [`CdfRecurrence`] and a [`BiasSource`]; callers interleave
/// [`TimeCdfEngine::advance`] with read-only queries (quantiles, velocity,
/// extreme-value variance) and may snapshot/restore the full state through
/// the accessor surface for host-driven replay.
///
/// # Examples
///
/// ```rust
/// use walk_engines::cdf::{TimeCdfConfig, TimeCdfEngine};
/// use walk_core::real::{one, real};
///
/// let config = TimeCdfConfig::builder().t_max(50).seed(7).build().unwrap();
/// let mut engine = TimeCdfEngine::new(config).unwrap();
/// for _ in 0..50 {
///     engine.advance().unwrap();
/// }
/// assert_eq!(engine.cdf()[0], one());
/// let position = engine.find_quantile(&real(1e9)).unwrap();
/// assert!(position <= 52);
/// ```
pub struct TimeCdfEngine {
    rec: CdfRecurrence,
    bias: BiasSource,
}

impl TimeCdfEngine {
    /// Builds the engine, preallocating both recurrence buffers.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the bias source rejects the shape parameter.
    pub fn new(config: TimeCdfConfig) -> SimResult<Self> {
        let bias = BiasSource::new(config.beta(), config.seed())?;
        Ok(Self {
            rec: CdfRecurrence::new(config.t_max()),
            bias,
        })
    }

    /// Advances the recurrence by one unit time step.
    ///
    /// # Errors
    ///
    /// `HorizonExceeded` once the configured horizon is reached.
    #[inline]
    pub fn advance(&mut self) -> SimResult<()> {
        self.rec.advance(&mut self.bias)
    }

    /// Finds the lattice position at which the tail first exceeds 1/q.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for q ≤ 0, `QuantileNotFound` if the descending
    /// scan completes without a crossing.
    pub fn find_quantile(&self, quantile: &Real) -> SimResult<i64> {
        let n = self.rec.find_crossing(quantile)?;
        Ok(self.rec.crossing_position(n))
    }

    /// Resolves many quantiles in a single combined descending scan.
    ///
    /// Input order does not matter: the engine sorts internally and the
    /// output matches per-element [`TimeCdfEngine::find_quantile`] calls
    /// position for position.
    pub fn find_quantiles(&self, quantiles: &[Real]) -> SimResult<Vec<i64>> {
        self.rec.find_crossings(quantiles)
    }

    /// Tail value and normalised velocity at a quantile's crossing.
    ///
    /// Returns `(Z(n, t), x/t)` for the crossing slot n with x = 2n − t.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` before the first step (velocity is undefined at
    /// t = 0) and for q ≤ 0; `QuantileNotFound` on an exhausted scan.
    pub fn prob_and_velocity(&self, quantile: &Real) -> SimResult<(Real, f64)> {
        let t = self.rec.time();
        if t == 0 {
            return Err(SimError::InvalidParameter {
                name: "time",
                value: "0 (advance before querying a velocity)".to_string(),
            });
        }
        let n = self.rec.find_crossing(quantile)?;
        let position = 2 * n as i64 - t as i64;
        Ok((self.rec.value(n).clone(), position as f64 / t as f64))
    }

    /// Extreme-value variance of the maximum among `n_particles` walkers.
    ///
    /// Completes the current tail curve with a trailing 0 and delegates to
    /// the supplied statistics collaborator.
    pub fn gumbel_variance<S: ExtremeValueStats>(
        &self,
        n_particles: &Real,
        stats: &S,
    ) -> SimResult<Real> {
        let (support, probs) = self.rec.tail_curve();
        stats.variance(&support, &probs, n_particles)
    }

    /// Sequence overload of [`TimeCdfEngine::gumbel_variance`].
    pub fn gumbel_variances<S: ExtremeValueStats>(
        &self,
        n_particles: &[Real],
        stats: &S,
    ) -> SimResult<Vec<Real>> {
        let (support, probs) = self.rec.tail_curve();
        stats.variances(&support, &probs, n_particles)
    }

    /// Lattice positions 2n − t for the evolved slots.
    #[inline]
    pub fn positions(&self) -> Vec<i64> {
        self.rec.positions()
    }

    /// Copy of the meaningful prefix (slots 0..=t+1), never a live view.
    #[inline]
    pub fn cdf(&self) -> Vec<Real> {
        self.rec.snapshot()
    }

    /// Restores an externally held snapshot.
    ///
    /// Pair with [`TimeCdfEngine::set_time`] to resume a serialised run;
    /// keeping the two consistent is the host's responsibility.
    #[inline]
    pub fn set_cdf(&mut self, cdf: &[Real]) -> SimResult<()> {
        self.rec.restore(cdf)
    }

    /// Current time t.
    #[inline]
    pub fn time(&self) -> usize {
        self.rec.time()
    }

    /// Sets the current time (≤ t_max).
    #[inline]
    pub fn set_time(&mut self, t: usize) -> SimResult<()> {
        self.rec.set_time(t)
    }

    /// Configured horizon.
    #[inline]
    pub fn t_max(&self) -> usize {
        self.rec.t_max()
    }

    /// Bias shape parameter.
    #[inline]
    pub fn beta(&self) -> f64 {
        self.bias.beta()
    }

    /// Switches the bias shape parameter for subsequent steps.
    #[inline]
    pub fn set_beta(&mut self, beta: f64) -> SimResult<()> {
        self.bias.set_beta(beta)
    }

    /// Construction seed of the bias source, if one was given.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.bias.seed()
    }

    /// Deterministically reseeds the bias source.
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.bias.reseed(seed);
    }
}
