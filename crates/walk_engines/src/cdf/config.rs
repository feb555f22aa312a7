//! Configuration for the CDF recurrence engines.

use walk_core::error::{SimError, SimResult};

/// Maximum time horizon allowed.
///
/// Two extended-precision buffers of `t_max + 2` slots are preallocated at
/// construction; this bound keeps a mistyped horizon from exhausting
/// memory before the first step runs.
pub const MAX_HORIZON: usize = 10_000_000;

/// CDF engine configuration.
///
/// Immutable once built. Use [`TimeCdfConfig::builder`] to construct
/// instances; `build` validates every field.
///
/// # Examples
///
/// ```rust
/// use walk_engines::cdf::TimeCdfConfig;
///
/// let config = TimeCdfConfig::builder()
///     .beta(0.5)
///     .t_max(1000)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.t_max(), 1000);
/// assert_eq!(config.seed(), Some(42));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeCdfConfig {
    /// Shape parameter of the symmetric Beta bias law.
    beta: f64,
    /// Time horizon the engine may be advanced to.
    t_max: usize,
    /// Optional seed for reproducibility.
    seed: Option<u64>,
}

impl TimeCdfConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> TimeCdfConfigBuilder {
        TimeCdfConfigBuilder::default()
    }

    /// Returns the bias shape parameter.
    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Returns the time horizon.
    #[inline]
    pub fn t_max(&self) -> usize {
        self.t_max
    }

    /// Returns the optional seed for reproducibility.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Builder for [`TimeCdfConfig`].
///
/// The shape parameter defaults to 1 (maximally disordered bias); the
/// horizon has no default and must be set.
#[derive(Clone, Debug, Default)]
pub struct TimeCdfConfigBuilder {
    beta: Option<f64>,
    t_max: Option<usize>,
    seed: Option<u64>,
}

impl TimeCdfConfigBuilder {
    /// Sets the bias shape parameter β (must be ≥ 0; +∞ is legal).
    #[inline]
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }

    /// Sets the time horizon (must be ≥ 1).
    #[inline]
    pub fn t_max(mut self, t_max: usize) -> Self {
        self.t_max = Some(t_max);
        self
    }

    /// Sets the RNG seed for reproducible runs.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the settings and produces the configuration.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if β is negative or NaN, if the horizon is
    /// missing, zero or above [`MAX_HORIZON`].
    pub fn build(self) -> SimResult<TimeCdfConfig> {
        let beta = self.beta.unwrap_or(1.0);
        if beta.is_nan() || beta < 0.0 {
            return Err(SimError::InvalidParameter {
                name: "beta",
                value: format!("{beta} (must be >= 0)"),
            });
        }
        let t_max = self.t_max.ok_or(SimError::InvalidParameter {
            name: "t_max",
            value: "missing (set a horizon >= 1)".to_string(),
        })?;
        if t_max == 0 || t_max > MAX_HORIZON {
            return Err(SimError::InvalidParameter {
                name: "t_max",
                value: format!("{t_max} (must be in 1..={MAX_HORIZON})"),
            });
        }
        Ok(TimeCdfConfig {
            beta,
            t_max,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_beta_to_uniform() {
        let config = TimeCdfConfig::builder().t_max(10).build().unwrap();
        assert_eq!(config.beta(), 1.0);
        assert_eq!(config.seed(), None);
    }

    #[test]
    fn test_missing_horizon_rejected() {
        let err = TimeCdfConfig::builder().beta(1.0).build().unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "t_max", .. }));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let err = TimeCdfConfig::builder().t_max(0).build().unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "t_max", .. }));
    }

    #[test]
    fn test_negative_beta_rejected() {
        let err = TimeCdfConfig::builder()
            .beta(-2.0)
            .t_max(10)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "beta", .. }));
    }

    #[test]
    fn test_infinite_beta_accepted() {
        let config = TimeCdfConfig::builder()
            .beta(f64::INFINITY)
            .t_max(10)
            .build()
            .unwrap();
        assert!(config.beta().is_infinite());
    }
}
