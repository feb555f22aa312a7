//! Configuration for the occupancy engine.

use walk_core::error::{SimError, SimResult};

/// Default small-count cutoff: 2³¹ − 2.
///
/// Below this occupancy the rightward transfer is an exact binomial draw.
pub const SMALL_CUTOFF_DEFAULT: f64 = 2147483646.0;

/// Default large-count cutoff.
///
/// Above this occupancy relative fluctuations are far below one ulp of the
/// mean and the transfer is the deterministic expectation.
pub const LARGE_CUTOFF_DEFAULT: f64 = 1e64;

/// Maximum initial occupancy size.
pub(crate) const MAX_OCCUPANCY: usize = 100_000_000;

/// Occupancy engine configuration.
///
/// Immutable once built. Use [`OccupancyConfig::builder`]; `build`
/// validates every field.
///
/// # Examples
///
/// ```rust
/// use walk_engines::occupancy::OccupancyConfig;
///
/// let config = OccupancyConfig::builder()
///     .n_particles(1e6)
///     .beta(1.0)
///     .occupancy_size(1000)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.occupancy_size(), 1000);
/// assert!(!config.static_environment());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyConfig {
    /// Total particle mass placed on site 0 at time 0.
    n_particles: f64,
    /// Shape parameter of the symmetric Beta bias law.
    beta: f64,
    /// Allocated sites (and allocated time steps for the edge arrays).
    occupancy_size: usize,
    /// Pure mass-transport mode: every transfer is the expectation.
    mass_transport: bool,
    /// Quenched disorder: one bias per site, reused across steps.
    static_environment: bool,
    /// Optional seed for reproducibility.
    seed: Option<u64>,
    /// Below this count the transfer is an exact binomial draw.
    small_cutoff: f64,
    /// Above this count the transfer is the deterministic expectation.
    large_cutoff: f64,
}

impl OccupancyConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> OccupancyConfigBuilder {
        OccupancyConfigBuilder::default()
    }

    /// Returns the total particle mass.
    #[inline]
    pub fn n_particles(&self) -> f64 {
        self.n_particles
    }

    /// Returns the bias shape parameter.
    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Returns the allocated number of sites.
    #[inline]
    pub fn occupancy_size(&self) -> usize {
        self.occupancy_size
    }

    /// Returns whether every transfer is deterministic mass transport.
    #[inline]
    pub fn mass_transport(&self) -> bool {
        self.mass_transport
    }

    /// Returns whether the disorder is quenched (one bias per site).
    #[inline]
    pub fn static_environment(&self) -> bool {
        self.static_environment
    }

    /// Returns the optional seed for reproducibility.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the small-count cutoff.
    #[inline]
    pub fn small_cutoff(&self) -> f64 {
        self.small_cutoff
    }

    /// Returns the large-count cutoff.
    #[inline]
    pub fn large_cutoff(&self) -> f64 {
        self.large_cutoff
    }
}

/// Builder for [`OccupancyConfig`].
///
/// Particle count and occupancy size have no defaults and must be set;
/// the shape parameter defaults to 1 and the cutoffs to
/// [`SMALL_CUTOFF_DEFAULT`] / [`LARGE_CUTOFF_DEFAULT`].
#[derive(Clone, Debug, Default)]
pub struct OccupancyConfigBuilder {
    n_particles: Option<f64>,
    beta: Option<f64>,
    occupancy_size: Option<usize>,
    mass_transport: bool,
    static_environment: bool,
    seed: Option<u64>,
    small_cutoff: Option<f64>,
    large_cutoff: Option<f64>,
}

impl OccupancyConfigBuilder {
    /// Sets the total particle mass (must be positive and finite).
    #[inline]
    pub fn n_particles(mut self, n_particles: f64) -> Self {
        self.n_particles = Some(n_particles);
        self
    }

    /// Sets the bias shape parameter β (must be ≥ 0; +∞ is legal).
    #[inline]
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }

    /// Sets the allocated number of sites (≥ 1).
    #[inline]
    pub fn occupancy_size(mut self, occupancy_size: usize) -> Self {
        self.occupancy_size = Some(occupancy_size);
        self
    }

    /// Selects pure mass-transport mode (deterministic expectation always).
    #[inline]
    pub fn mass_transport(mut self, mass_transport: bool) -> Self {
        self.mass_transport = mass_transport;
        self
    }

    /// Selects quenched disorder (one cached bias per site).
    #[inline]
    pub fn static_environment(mut self, static_environment: bool) -> Self {
        self.static_environment = static_environment;
        self
    }

    /// Sets the RNG seed for reproducible runs.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Overrides the small-count cutoff.
    #[inline]
    pub fn small_cutoff(mut self, small_cutoff: f64) -> Self {
        self.small_cutoff = Some(small_cutoff);
        self
    }

    /// Overrides the large-count cutoff.
    #[inline]
    pub fn large_cutoff(mut self, large_cutoff: f64) -> Self {
        self.large_cutoff = Some(large_cutoff);
        self
    }

    /// Validates the settings and produces the configuration.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a missing or non-positive particle count or
    /// size, a negative or NaN β, or cutoffs violating
    /// 0 < small ≤ large < ∞.
    pub fn build(self) -> SimResult<OccupancyConfig> {
        let n_particles = self.n_particles.ok_or(SimError::InvalidParameter {
            name: "n_particles",
            value: "missing (set a positive particle count)".to_string(),
        })?;
        if !n_particles.is_finite() || n_particles <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: "n_particles",
                value: format!("{n_particles} (must be positive and finite)"),
            });
        }
        let beta = self.beta.unwrap_or(1.0);
        if beta.is_nan() || beta < 0.0 {
            return Err(SimError::InvalidParameter {
                name: "beta",
                value: format!("{beta} (must be >= 0)"),
            });
        }
        let occupancy_size = self.occupancy_size.ok_or(SimError::InvalidParameter {
            name: "occupancy_size",
            value: "missing (set an initial size >= 1)".to_string(),
        })?;
        if occupancy_size == 0 || occupancy_size > MAX_OCCUPANCY {
            return Err(SimError::InvalidParameter {
                name: "occupancy_size",
                value: format!("{occupancy_size} (must be in 1..={MAX_OCCUPANCY})"),
            });
        }
        let small_cutoff = self.small_cutoff.unwrap_or(SMALL_CUTOFF_DEFAULT);
        let large_cutoff = self.large_cutoff.unwrap_or(LARGE_CUTOFF_DEFAULT);
        validate_cutoffs(small_cutoff, large_cutoff)?;
        Ok(OccupancyConfig {
            n_particles,
            beta,
            occupancy_size,
            mass_transport: self.mass_transport,
            static_environment: self.static_environment,
            seed: self.seed,
            small_cutoff,
            large_cutoff,
        })
    }
}

/// Shared cutoff validation, also used by the engine's setters.
pub(crate) fn validate_cutoffs(small: f64, large: f64) -> SimResult<()> {
    if !small.is_finite() || small <= 0.0 {
        return Err(SimError::InvalidParameter {
            name: "small_cutoff",
            value: format!("{small} (must be positive and finite)"),
        });
    }
    if !large.is_finite() || large < small {
        return Err(SimError::InvalidParameter {
            name: "large_cutoff",
            value: format!("{large} (must be finite and >= small_cutoff = {small})"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OccupancyConfig::builder()
            .n_particles(1000.0)
            .occupancy_size(50)
            .build()
            .unwrap();
        assert_eq!(config.beta(), 1.0);
        assert_eq!(config.small_cutoff(), SMALL_CUTOFF_DEFAULT);
        assert_eq!(config.large_cutoff(), LARGE_CUTOFF_DEFAULT);
        assert!(!config.mass_transport());
        assert!(!config.static_environment());
    }

    #[test]
    fn test_missing_particle_count_rejected() {
        let err = OccupancyConfig::builder()
            .occupancy_size(50)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "n_particles", .. }));
    }

    #[test]
    fn test_nonpositive_particle_count_rejected() {
        let err = OccupancyConfig::builder()
            .n_particles(0.0)
            .occupancy_size(50)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "n_particles", .. }));
    }

    #[test]
    fn test_inverted_cutoffs_rejected() {
        let err = OccupancyConfig::builder()
            .n_particles(10.0)
            .occupancy_size(10)
            .small_cutoff(1e10)
            .large_cutoff(1e4)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "large_cutoff", .. }));
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = OccupancyConfig::builder()
            .n_particles(10.0)
            .occupancy_size(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "occupancy_size", .. }));
    }
}
