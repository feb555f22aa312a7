//! Random bias generation for the disordered environment.
//!
//! This module provides [`BiasSource`], a seeded RNG wrapper that draws the
//! per-site, per-step bias values governing which direction mass moves. The
//! same wrapper also serves the occupancy engine's transfer sampling
//! (binomial and Gaussian draws), so one owned generator drives every
//! random decision an engine makes; reseeding it reproduces an entire run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Binomial, Distribution, Normal};
use walk_core::error::{SimError, SimResult};

/// Bias law selected by the shape parameter at construction.
///
/// Static dispatch over the four regimes of the symmetric Beta(β, β)
/// family; the degenerate endpoints are handled exactly rather than by
/// sampling a razor-thin density.
#[derive(Clone, Debug)]
enum BiasLaw {
    /// β = 0: each site is fully biased one way or the other.
    Bernoulli,
    /// β = 1: the Beta density is flat.
    Uniform,
    /// β = ∞: no disorder, every bias is exactly one half.
    Symmetric,
    /// 0 < β < ∞, β ≠ 1.
    Beta(Beta<f64>),
}

/// Disordered-environment bias generator.
///
/// Draws one independent value in [0, 1] per call, distributed according to
/// the configured shape parameter β:
///
/// - β = 0 → exactly 0.0 or 1.0 (a rounded uniform draw)
/// - β = 1 → uniform in [0, 1)
/// - β = +∞ → exactly 0.5
/// - otherwise → a symmetric Beta(β, β) sample
///
/// # Seeding
///
/// `Some(seed)` gives a reproducible stream; `None` draws entropy from the
/// operating system once at construction. [`BiasSource::reseed`]
/// reinitialises the stream deterministically at any point.
///
/// # Examples
///
/// ```rust
/// use walk_engines::bias::BiasSource;
///
/// let mut a = BiasSource::new(1.0, Some(42)).unwrap();
/// let mut b = BiasSource::new(1.0, Some(42)).unwrap();
/// assert_eq!(a.draw(), b.draw());
///
/// let mut symmetric = BiasSource::new(f64::INFINITY, None).unwrap();
/// assert_eq!(symmetric.draw(), 0.5);
/// ```
#[derive(Clone, Debug)]
pub struct BiasSource {
    /// The underlying PRNG instance.
    inner: StdRng,
    /// Shape parameter of the symmetric Beta family.
    beta: f64,
    /// The seed used for initialisation, if one was given.
    seed: Option<u64>,
    /// Dispatch over the four bias regimes.
    law: BiasLaw,
}

impl BiasSource {
    /// Creates a bias source for shape parameter `beta`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `beta` is negative or NaN. β = +∞ is legal and
    /// selects the disorder-free regime.
    pub fn new(beta: f64, seed: Option<u64>) -> SimResult<Self> {
        let law = Self::law_for(beta)?;
        let inner = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            inner,
            beta,
            seed,
            law,
        })
    }

    fn law_for(beta: f64) -> SimResult<BiasLaw> {
        if beta.is_nan() || beta < 0.0 {
            return Err(SimError::InvalidParameter {
                name: "beta",
                value: format!("{beta} (must be >= 0)"),
            });
        }
        if beta == 0.0 {
            Ok(BiasLaw::Bernoulli)
        } else if beta == 1.0 {
            Ok(BiasLaw::Uniform)
        } else if beta.is_infinite() {
            Ok(BiasLaw::Symmetric)
        } else {
            let dist = Beta::new(beta, beta).map_err(|e| SimError::InvalidParameter {
                name: "beta",
                value: format!("{beta} ({e})"),
            })?;
            Ok(BiasLaw::Beta(dist))
        }
    }

    /// Returns the shape parameter.
    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Switches the shape parameter, keeping the generator state.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `beta` is negative or NaN.
    pub fn set_beta(&mut self, beta: f64) -> SimResult<()> {
        self.law = Self::law_for(beta)?;
        self.beta = beta;
        Ok(())
    }

    /// Returns the construction seed, if one was given.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Deterministically reinitialises the generator state.
    pub fn reseed(&mut self, seed: u64) {
        self.inner = StdRng::seed_from_u64(seed);
        self.seed = Some(seed);
        tracing::debug!(seed, "bias source reseeded");
    }

    /// Draws one independent bias value in [0, 1].
    #[inline]
    pub fn draw(&mut self) -> f64 {
        match &self.law {
            BiasLaw::Bernoulli => self.inner.gen::<f64>().round(),
            BiasLaw::Uniform => self.inner.gen::<f64>(),
            BiasLaw::Symmetric => 0.5,
            BiasLaw::Beta(dist) => dist.sample(&mut self.inner),
        }
    }

    /// Draws the number of successes among `count` trials at probability `p`.
    ///
    /// Used by the discrete occupancy regime, where per-particle moves must
    /// carry genuine binomial fluctuation. `p` is clamped to [0, 1]; a
    /// degenerate distribution falls back to the rounded expectation.
    #[inline]
    pub fn binomial(&mut self, count: u64, p: f64) -> u64 {
        let p = p.clamp(0.0, 1.0);
        match Binomial::new(count, p) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => (count as f64 * p).round() as u64,
        }
    }

    /// Draws a Gaussian sample with the given mean and standard deviation.
    ///
    /// Used by the occupancy regime between the two cutoffs, where the
    /// binomial is approximated by its Gaussian limit. A non-positive or
    /// non-finite deviation falls back to the mean.
    #[inline]
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        if !(std_dev > 0.0) || !std_dev.is_finite() {
            return mean;
        }
        match Normal::new(mean, std_dev) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => mean,
        }
    }
}
