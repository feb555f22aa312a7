//! Trajectory view of the CDF recurrence.

use walk_core::error::{SimError, SimResult};
use walk_core::real::{zero, Real};

use super::config::TimeCdfConfig;
use super::recurrence::CdfRecurrence;
use crate::bias::BiasSource;

/// Quantile-trajectory engine over the cumulative tail recurrence.
///
/// Fixed at construction with an ordered set of target quantiles; every
/// call to [`PositionCdfEngine::step_position`] advances the recurrence by
/// one step (the same update rule as [`super::TimeCdfEngine`]) and records
/// each target's current crossing position. After N successful steps every
/// trajectory holds N positions: the full time evolution of a quantile
/// rather than its terminal value.
///
/// # Examples
///
/// ```rust
/// use walk_engines::cdf::{PositionCdfEngine, TimeCdfConfig};
/// use walk_core::real::real;
///
/// let config = TimeCdfConfig::builder().t_max(20).seed(3).build().unwrap();
/// let targets = vec![real(100.0), real(1e6)];
/// let mut engine = PositionCdfEngine::new(config, targets).unwrap();
/// for _ in 0..20 {
///     engine.step_position().unwrap();
/// }
/// let trajectories = engine.trajectories();
/// assert_eq!(trajectories.len(), 2);
/// assert_eq!(trajectories[0].len(), 20);
/// ```
#[derive(Debug)]
pub struct PositionCdfEngine {
    rec: CdfRecurrence,
    bias: BiasSource,
    quantiles: Vec<Real>,
    trajectories: Vec<Vec<i64>>,
}

impl PositionCdfEngine {
    /// Builds the engine for a fixed set of target quantiles.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the target set is empty or contains a
    /// quantile ≤ 0, or if the bias source rejects the shape parameter.
    pub fn new(config: TimeCdfConfig, quantiles: Vec<Real>) -> SimResult<Self> {
        if quantiles.is_empty() {
            return Err(SimError::InvalidParameter {
                name: "quantiles",
                value: "empty target set".to_string(),
            });
        }
        if let Some(bad) = quantiles.iter().find(|q| !(*q > &zero())) {
            return Err(SimError::InvalidParameter {
                name: "quantiles",
                value: format!("{bad} (must be > 0)"),
            });
        }
        let bias = BiasSource::new(config.beta(), config.seed())?;
        let trajectories = vec![Vec::with_capacity(config.t_max()); quantiles.len()];
        Ok(Self {
            rec: CdfRecurrence::new(config.t_max()),
            bias,
            quantiles,
            trajectories,
        })
    }

    /// Advances one step and appends each target's crossing position.
    ///
    /// All targets are resolved before any trajectory is extended; a failed
    /// resolution leaves every trajectory unchanged.
    ///
    /// # Errors
    ///
    /// `HorizonExceeded` past the configured horizon, `QuantileNotFound`
    /// if a target has no crossing at the new time.
    pub fn step_position(&mut self) -> SimResult<()> {
        self.rec.advance(&mut self.bias)?;
        let positions = self.rec.find_crossings(&self.quantiles)?;
        for (trajectory, position) in self.trajectories.iter_mut().zip(positions) {
            trajectory.push(position);
        }
        Ok(())
    }

    /// The target quantiles, in construction order.
    #[inline]
    pub fn quantiles(&self) -> Vec<Real> {
        self.quantiles.clone()
    }

    /// Copies of the recorded trajectories, index-aligned with the targets.
    #[inline]
    pub fn trajectories(&self) -> Vec<Vec<i64>> {
        self.trajectories.clone()
    }

    /// Current time t (equals the number of successful steps).
    #[inline]
    pub fn time(&self) -> usize {
        self.rec.time()
    }

    /// Deterministically reseeds the bias source.
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.bias.reseed(seed);
    }
}
