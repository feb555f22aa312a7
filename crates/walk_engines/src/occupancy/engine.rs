//! The per-site particle/mass evolution engine.

use std::cmp::Ordering;

use walk_core::error::{SimError, SimResult};
use walk_core::real::{real, real_from_u64, to_f64, zero, Real};
use walk_core::stats::ExtremeValueStats;

use super::config::{validate_cutoffs, OccupancyConfig, MAX_OCCUPANCY};
use crate::bias::BiasSource;

/// Largest count handed to the exact binomial sampler.
///
/// Counts are integral in the discrete regime and must survive the trip
/// through f64; beyond 2^53 the Gaussian approximation takes over even if
/// the configured small cutoff is higher.
const BINOMIAL_EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Occupancy simulation of a disordered directed walk.
///
/// Starts with the whole particle mass on site 0 and, per time step, moves
/// a bias-weighted portion of every active site one site to the right
/// (reduced coordinates: lattice position = 2·site − t). The engine tracks
/// the active boundary per step so a step never scans the full allocated
/// array, and it records one (min, max) pair per time step so past
/// boundaries remain queryable.
///
/// # Transfer Regimes
///
/// For a site holding `count` particles with local bias `b`, the portion
/// moving right is:
///
/// - always `count × b` in mass-transport mode;
/// - an exact Binomial(count, b) draw below the small cutoff;
/// - the deterministic expectation `count × b` above the large cutoff;
/// - between the cutoffs, a rounded Gaussian draw with the binomial's mean
///   and deviation, clamped to [0, count]: the bridge between the two
///   regimes, keeping O(1) sampling cost at counts where exact binomial
///   sampling is out of range while preserving fluctuations to leading
///   order.
///
/// # Environment
///
/// Dynamic (annealed) disorder draws a fresh bias per site per step;
/// static (quenched) disorder draws one bias per site on first visit and
/// reuses it for every later step.
///
/// # Examples
///
/// ```rust
/// use walk_engines::occupancy::{OccupancyConfig, OccupancyEngine};
///
/// let config = OccupancyConfig::builder()
///     .n_particles(1000.0)
///     .beta(1.0)
///     .occupancy_size(50)
///     .seed(42)
///     .build()
///     .unwrap();
/// let mut engine = OccupancyEngine::new(config).unwrap();
/// engine.advance().unwrap();
/// assert_eq!(engine.time(), 1);
/// assert!(engine.max_idx() <= 1);
/// ```
pub struct OccupancyEngine {
    /// Per-site particle or mass counts.
    occupancy: Vec<Real>,
    /// Conserved total mass.
    n_particles: Real,
    /// Current time step.
    time: usize,
    /// Minimal active index, one entry per time step.
    edges_min: Vec<usize>,
    /// Maximal active index, one entry per time step.
    edges_max: Vec<usize>,
    /// Quenched per-site biases, drawn lazily on first visit.
    site_bias: Vec<Option<f64>>,
    /// Bias and transfer-noise generator.
    bias: BiasSource,
    small_cutoff: f64,
    large_cutoff: f64,
    mass_transport: bool,
    static_environment: bool,
}

impl OccupancyEngine {
    /// Builds the engine with all storage preallocated.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the bias source rejects the shape parameter.
    pub fn new(config: OccupancyConfig) -> SimResult<Self> {
        let bias = BiasSource::new(config.beta(), config.seed())?;
        let size = config.occupancy_size();
        let mut occupancy = vec![zero(); size];
        occupancy[0] = real(config.n_particles());
        Ok(Self {
            occupancy,
            n_particles: real(config.n_particles()),
            time: 0,
            edges_min: vec![0; size],
            edges_max: vec![0; size],
            site_bias: vec![None; size],
            bias,
            small_cutoff: config.small_cutoff(),
            large_cutoff: config.large_cutoff(),
            mass_transport: config.mass_transport(),
            static_environment: config.static_environment(),
        })
    }

    /// Advances the simulation by one unit time step.
    ///
    /// Walks the active window left to right carrying the rightward-moving
    /// mass, then records the new active boundary for the incremented
    /// time. Total mass is conserved by construction: what leaves a site
    /// lands on its neighbour within the same pass.
    ///
    /// # Errors
    ///
    /// `CapacityExhausted` if the support or the edge storage would
    /// outgrow the allocated arrays; call [`OccupancyEngine::resize`]
    /// first. The check runs before any site is touched, so a failed step
    /// leaves the state unmodified.
    pub fn advance(&mut self) -> SimResult<()> {
        let t = self.time;
        if t + 1 >= self.edges_min.len() {
            return Err(SimError::CapacityExhausted {
                needed: t + 2,
                capacity: self.edges_min.len(),
            });
        }
        let lo = self.edges_min[t];
        let hi = self.edges_max[t];
        if hi + 1 >= self.occupancy.len() {
            return Err(SimError::CapacityExhausted {
                needed: hi + 2,
                capacity: self.occupancy.len(),
            });
        }

        let mut carry = zero();
        let mut new_lo = usize::MAX;
        let mut new_hi = lo;
        for i in lo..=hi + 1 {
            let site = self.occupancy[i].clone();
            let b = self.local_bias(i);
            let moved = self.to_next_site(&site, b);
            let updated = site - &moved + carry;
            if updated != zero() {
                if new_lo == usize::MAX {
                    new_lo = i;
                }
                new_hi = i;
            }
            self.occupancy[i] = updated;
            carry = moved;
        }
        if new_lo == usize::MAX {
            new_lo = lo;
            new_hi = lo;
        }
        self.edges_min[t + 1] = new_lo;
        self.edges_max[t + 1] = new_hi;
        self.time = t + 1;
        Ok(())
    }

    /// The local bias at a site: cached under quenched disorder, fresh
    /// otherwise.
    fn local_bias(&mut self, site: usize) -> f64 {
        if self.static_environment {
            match self.site_bias[site] {
                Some(b) => b,
                None => {
                    let b = self.bias.draw();
                    self.site_bias[site] = Some(b);
                    b
                }
            }
        } else {
            self.bias.draw()
        }
    }

    /// Portion of a site's mass moving one site to the right.
    fn to_next_site(&mut self, site: &Real, bias: f64) -> Real {
        if site == &zero() {
            return zero();
        }
        if self.mass_transport {
            return site * &real(bias);
        }
        let count = to_f64(site);
        if count < self.small_cutoff && count < BINOMIAL_EXACT_LIMIT {
            let trials = count.floor() as u64;
            real_from_u64(self.bias.binomial(trials, bias))
        } else if count > self.large_cutoff {
            site * &real(bias)
        } else {
            let mean = count * bias;
            let deviation = (count * bias * (1.0 - bias)).sqrt();
            let moved = self
                .bias
                .normal(mean, deviation)
                .round()
                .clamp(0.0, count.floor());
            real(moved)
        }
    }

    /// Validates a quantile and returns the n_particles/q scan threshold.
    fn mass_threshold(&self, q: &Real) -> SimResult<Real> {
        if !(q > &zero()) {
            return Err(SimError::InvalidParameter {
                name: "quantile",
                value: format!("{q} (must be > 0)"),
            });
        }
        Ok(&self.n_particles / q)
    }

    /// Lattice position of a site index at the current time.
    #[inline]
    fn lattice_position(&self, idx: usize) -> i64 {
        2 * idx as i64 - self.time as i64
    }

    /// Finds the lattice position where the tail mass first exceeds
    /// n_particles/q, scanning the active window from the right.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for q ≤ 0, `QuantileNotFound` if the scan
    /// completes without a crossing.
    pub fn find_quantile(&self, quantile: &Real) -> SimResult<i64> {
        let threshold = self.mass_threshold(quantile)?;
        let t = self.time;
        let (lo, hi) = (self.edges_min[t], self.edges_max[t]);
        let mut cum = zero();
        for i in (lo..=hi).rev() {
            cum = cum + &self.occupancy[i];
            if cum > threshold {
                return Ok(self.lattice_position(i));
            }
        }
        Err(SimError::QuantileNotFound {
            quantile: quantile.to_string(),
        })
    }

    /// Resolves many quantiles in a single descending scan.
    ///
    /// Input order does not matter: the engine sorts internally and the
    /// output matches per-element [`OccupancyEngine::find_quantile`] calls
    /// position for position.
    pub fn find_quantiles(&self, quantiles: &[Real]) -> SimResult<Vec<i64>> {
        if quantiles.is_empty() {
            return Ok(Vec::new());
        }
        let thresholds: Vec<Real> = quantiles
            .iter()
            .map(|q| self.mass_threshold(q))
            .collect::<SimResult<_>>()?;
        let mut order: Vec<usize> = (0..quantiles.len()).collect();
        order.sort_by(|&a, &b| {
            thresholds[a]
                .partial_cmp(&thresholds[b])
                .unwrap_or(Ordering::Equal)
        });

        let t = self.time;
        let (lo, hi) = (self.edges_min[t], self.edges_max[t]);
        let mut positions = vec![0_i64; quantiles.len()];
        let mut resolved = 0;
        let mut cum = zero();
        'scan: for i in (lo..=hi).rev() {
            cum = cum + &self.occupancy[i];
            while cum > thresholds[order[resolved]] {
                positions[order[resolved]] = self.lattice_position(i);
                resolved += 1;
                if resolved == order.len() {
                    break 'scan;
                }
            }
        }
        if resolved < order.len() {
            return Err(SimError::QuantileNotFound {
                quantile: quantiles[order[resolved]].to_string(),
            });
        }
        Ok(positions)
    }

    /// Probability of sitting strictly beyond the given site index.
    pub fn p_greater_than_x(&self, idx: usize) -> Real {
        let t = self.time;
        let (lo, hi) = (self.edges_min[t], self.edges_max[t]);
        let mut tail = zero();
        for i in lo..=hi {
            if i > idx {
                tail = tail + &self.occupancy[i];
            }
        }
        tail / &self.n_particles
    }

    /// Tail probability at a normalised velocity v ∈ [0, 1].
    ///
    /// The walk at velocity v sits at position x = v·t, i.e. site index
    /// ⌊(1 + v)·t / 2⌋; the returned probability is the mass strictly
    /// beyond that site.
    fn velocity_tail(&self, v: f64) -> Real {
        let t = self.time as f64;
        let idx = (((1.0 + v) * t) / 2.0).floor() as usize;
        self.p_greater_than_x(idx)
    }

    /// Samples `num` evenly spaced velocities v = k/num and pairs each
    /// with its tail probability.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for `num` = 0 or before the first step.
    pub fn velocity_curve(&self, num: usize) -> SimResult<Vec<(f64, Real)>> {
        if num == 0 {
            return Err(SimError::InvalidParameter {
                name: "num",
                value: "0 (must be >= 1)".to_string(),
            });
        }
        if self.time == 0 {
            return Err(SimError::InvalidParameter {
                name: "time",
                value: "0 (advance before sampling velocities)".to_string(),
            });
        }
        let mut curve = Vec::with_capacity(num);
        for k in 1..=num {
            let v = k as f64 / num as f64;
            curve.push((v, self.velocity_tail(v)));
        }
        Ok(curve)
    }

    /// The single (velocity, tail probability) pair at velocity v.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for v outside [0, 1] or before the first step.
    pub fn velocity_point(&self, v: f64) -> SimResult<(f64, Real)> {
        if !(0.0..=1.0).contains(&v) {
            return Err(SimError::InvalidParameter {
                name: "velocity",
                value: format!("{v} (must be in [0, 1])"),
            });
        }
        if self.time == 0 {
            return Err(SimError::InvalidParameter {
                name: "time",
                value: "0 (advance before sampling velocities)".to_string(),
            });
        }
        Ok((v, self.velocity_tail(v)))
    }

    /// Evolves the simulation until every (position, quantile) pair in the
    /// cartesian product has first crossed its threshold, returning the
    /// matrix of first-passage times (`result[p][q]` for `positions[p]`
    /// and `quantiles[q]`).
    ///
    /// Resolved pairs stop being observed; unresolved pairs are checked
    /// after every step. A quantile that is not yet resolvable at some
    /// step simply stays pending.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a quantile ≤ 0, `CapacityExhausted` if the
    /// evolution outgrows the allocated storage before every pair
    /// resolves.
    pub fn evolve_and_save_first_passage(
        &mut self,
        positions: &[i64],
        quantiles: &[Real],
    ) -> SimResult<Vec<Vec<u64>>> {
        for q in quantiles {
            self.mass_threshold(q)?;
        }
        let mut times = vec![vec![0_u64; quantiles.len()]; positions.len()];
        let mut resolved = vec![vec![false; quantiles.len()]; positions.len()];
        let mut pending = positions.len() * quantiles.len();
        while pending > 0 {
            self.advance()?;
            for (pi, &target) in positions.iter().enumerate() {
                for (qi, q) in quantiles.iter().enumerate() {
                    if resolved[pi][qi] {
                        continue;
                    }
                    match self.find_quantile(q) {
                        Ok(x) if x >= target => {
                            times[pi][qi] = self.time as u64;
                            resolved[pi][qi] = true;
                            pending -= 1;
                            tracing::debug!(
                                position = target,
                                time = self.time,
                                "first passage resolved"
                            );
                        }
                        Ok(_) | Err(SimError::QuantileNotFound { .. }) => {}
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Ok(times)
    }

    /// The tail-mass curve over the active window.
    ///
    /// Entry k is the probability of sitting at or beyond site
    /// `min_idx() + k`: monotone non-increasing, starting at 1 while mass
    /// is conserved. This is the same orientation the CDF engine maintains.
    pub fn cdf(&self) -> Vec<Real> {
        let t = self.time;
        let (lo, hi) = (self.edges_min[t], self.edges_max[t]);
        let mut curve = vec![zero(); hi - lo + 1];
        let mut tail = zero();
        for i in (lo..=hi).rev() {
            tail = tail + &self.occupancy[i];
            curve[i - lo] = &tail / &self.n_particles;
        }
        curve
    }

    /// Lattice positions and normalised per-site mass over the active
    /// window.
    pub fn positions_and_pdf(&self) -> (Vec<i64>, Vec<Real>) {
        let t = self.time;
        let (lo, hi) = (self.edges_min[t], self.edges_max[t]);
        let positions = (lo..=hi).map(|i| self.lattice_position(i)).collect();
        let pdf = (lo..=hi)
            .map(|i| &self.occupancy[i] / &self.n_particles)
            .collect();
        (positions, pdf)
    }

    /// Extreme-value variance of the maximum among `n_particles` walkers,
    /// derived from the occupancy tail curve completed with a trailing 0.
    pub fn gumbel_variance<S: ExtremeValueStats>(
        &self,
        n_particles: &Real,
        stats: &S,
    ) -> SimResult<Real> {
        let t = self.time;
        let (lo, hi) = (self.edges_min[t], self.edges_max[t]);
        let mut support: Vec<i64> = (lo..=hi).map(|i| self.lattice_position(i)).collect();
        support.push(self.lattice_position(hi + 1));
        let mut probs = self.cdf();
        probs.push(zero());
        stats.variance(&support, &probs, n_particles)
    }

    /// Extends occupancy, both edge sequences and the quenched-bias cache
    /// by `extra` slots.
    ///
    /// Exclusive-access mutation; never called while a step is in
    /// progress.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the grown size would exceed the allocation
    /// bound.
    pub fn resize(&mut self, extra: usize) -> SimResult<()> {
        if extra == 0 {
            return Ok(());
        }
        let new_size = self.occupancy.len().saturating_add(extra);
        if new_size > MAX_OCCUPANCY {
            return Err(SimError::InvalidParameter {
                name: "extra",
                value: format!("{extra} (grown size {new_size} exceeds {MAX_OCCUPANCY})"),
            });
        }
        self.occupancy.resize(new_size, zero());
        self.edges_min.resize(new_size, 0);
        self.edges_max.resize(new_size, 0);
        self.site_bias.resize(new_size, None);
        tracing::debug!(extra, new_size, "occupancy storage resized");
        Ok(())
    }

    /// Full copy of the occupancy array, never a live view.
    #[inline]
    pub fn occupancy(&self) -> Vec<Real> {
        self.occupancy.clone()
    }

    /// Copy of the active window only.
    pub fn active_occupancy(&self) -> Vec<Real> {
        let t = self.time;
        self.occupancy[self.edges_min[t]..=self.edges_max[t]].to_vec()
    }

    /// Replaces the occupancy array with an externally held snapshot.
    ///
    /// # Errors
    ///
    /// `LengthMismatch` unless the snapshot matches the allocated size,
    /// `InvalidParameter` if any entry is negative.
    pub fn set_occupancy(&mut self, occupancy: &[Real]) -> SimResult<()> {
        if occupancy.len() != self.occupancy.len() {
            return Err(SimError::LengthMismatch {
                left: occupancy.len(),
                right: self.occupancy.len(),
            });
        }
        if occupancy.iter().any(|v| v < &zero()) {
            return Err(SimError::InvalidParameter {
                name: "occupancy",
                value: "negative site count".to_string(),
            });
        }
        self.occupancy.clone_from_slice(occupancy);
        Ok(())
    }

    /// Copies of both edge sequences (min, max), indexed by time step.
    #[inline]
    pub fn edges(&self) -> (Vec<usize>, Vec<usize>) {
        (self.edges_min.clone(), self.edges_max.clone())
    }

    /// Replaces both edge sequences.
    ///
    /// # Errors
    ///
    /// `LengthMismatch` unless both sequences match the allocated size,
    /// `InvalidParameter` if any entry is inverted or out of range.
    pub fn set_edges(&mut self, min: &[usize], max: &[usize]) -> SimResult<()> {
        if min.len() != self.edges_min.len() || max.len() != self.edges_max.len() {
            return Err(SimError::LengthMismatch {
                left: min.len().min(max.len()),
                right: self.edges_min.len(),
            });
        }
        for (step, (&m, &x)) in min.iter().zip(max.iter()).enumerate() {
            if m > x || x >= self.occupancy.len() {
                return Err(SimError::InvalidParameter {
                    name: "edges",
                    value: format!("({m}, {x}) at step {step} out of range"),
                });
            }
        }
        self.edges_min.clone_from_slice(min);
        self.edges_max.clone_from_slice(max);
        Ok(())
    }

    /// Minimal active index at the current time.
    #[inline]
    pub fn min_idx(&self) -> usize {
        self.edges_min[self.time]
    }

    /// Maximal active index at the current time.
    #[inline]
    pub fn max_idx(&self) -> usize {
        self.edges_max[self.time]
    }

    /// Current time step.
    #[inline]
    pub fn time(&self) -> usize {
        self.time
    }

    /// Sets the current time step (must index the edge sequences).
    pub fn set_time(&mut self, time: usize) -> SimResult<()> {
        if time >= self.edges_min.len() {
            return Err(SimError::InvalidParameter {
                name: "time",
                value: format!("{time} (must be < {})", self.edges_min.len()),
            });
        }
        self.time = time;
        Ok(())
    }

    /// Conserved total mass.
    #[inline]
    pub fn n_particles(&self) -> Real {
        self.n_particles.clone()
    }

    /// Allocated number of sites.
    #[inline]
    pub fn occupancy_size(&self) -> usize {
        self.occupancy.len()
    }

    /// Replaces the total mass used to normalise probability queries.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` unless the count is positive and finite.
    pub fn set_n_particles(&mut self, n_particles: f64) -> SimResult<()> {
        if !n_particles.is_finite() || n_particles <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: "n_particles",
                value: format!("{n_particles} (must be positive and finite)"),
            });
        }
        self.n_particles = real(n_particles);
        Ok(())
    }

    /// Bias shape parameter.
    #[inline]
    pub fn beta(&self) -> f64 {
        self.bias.beta()
    }

    /// Switches the bias shape parameter for subsequent steps.
    ///
    /// Under quenched disorder only sites not yet visited are affected;
    /// cached biases stay in place.
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
    ///
    /// Cached quenched biases are part of the environment, not of the
    /// generator, and survive a reseed.
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.bias.reseed(seed);
    }

    /// Copy of the quenched per-site bias cache.
    #[inline]
    pub fn site_biases(&self) -> Vec<Option<f64>> {
        self.site_bias.clone()
    }

    /// Small-count cutoff.
    #[inline]
    pub fn small_cutoff(&self) -> f64 {
        self.small_cutoff
    }

    /// Sets the small-count cutoff (0 < small ≤ large).
    pub fn set_small_cutoff(&mut self, small_cutoff: f64) -> SimResult<()> {
        validate_cutoffs(small_cutoff, self.large_cutoff)?;
        self.small_cutoff = small_cutoff;
        Ok(())
    }

    /// Large-count cutoff.
    #[inline]
    pub fn large_cutoff(&self) -> f64 {
        self.large_cutoff
    }

    /// Sets the large-count cutoff (0 < small ≤ large).
    pub fn set_large_cutoff(&mut self, large_cutoff: f64) -> SimResult<()> {
        validate_cutoffs(self.small_cutoff, large_cutoff)?;
        self.large_cutoff = large_cutoff;
        Ok(())
    }

    /// Whether every transfer is deterministic mass transport.
    #[inline]
    pub fn mass_transport(&self) -> bool {
        self.mass_transport
    }

    /// Switches pure mass-transport mode on or off.
    #[inline]
    pub fn set_mass_transport(&mut self, mass_transport: bool) {
        self.mass_transport = mass_transport;
    }

    /// Whether the disorder is quenched.
    #[inline]
    pub fn static_environment(&self) -> bool {
        self.static_environment
    }

    /// Switches quenched disorder on or off.
    ///
    /// Biases already cached stay cached; switching back on resumes using
    /// them.
    #[inline]
    pub fn set_static_environment(&mut self, static_environment: bool) {
        self.static_environment = static_environment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use walk_core::real::one;
    use walk_core::stats::GumbelStats;

    fn build(config: OccupancyConfig) -> OccupancyEngine {
        OccupancyEngine::new(config).unwrap()
    }

    fn discrete(n_particles: f64, size: usize, seed: u64) -> OccupancyEngine {
        build(
            OccupancyConfig::builder()
                .n_particles(n_particles)
                .beta(1.0)
                .occupancy_size(size)
                .seed(seed)
                .build()
                .unwrap(),
        )
    }

    fn symmetric_transport(n_particles: f64, size: usize) -> OccupancyEngine {
        build(
            OccupancyConfig::builder()
                .n_particles(n_particles)
                .beta(f64::INFINITY)
                .occupancy_size(size)
                .mass_transport(true)
                .seed(0)
                .build()
                .unwrap(),
        )
    }

    fn total_mass(engine: &OccupancyEngine) -> Real {
        engine
            .occupancy()
            .iter()
            .fold(zero(), |acc, v| acc + v)
    }

    #[test]
    fn test_discrete_regime_conserves_mass_exactly() {
        let mut engine = discrete(1000.0, 50, 42);
        for _ in 0..20 {
            engine.advance().unwrap();
            assert_eq!(total_mass(&engine), real(1000.0));
        }
    }

    #[test]
    fn test_deterministic_regime_conserves_mass() {
        // 1e70 is above the default large cutoff from the first step.
        let mut engine = discrete(1e70, 30, 7);
        for _ in 0..10 {
            engine.advance().unwrap();
        }
        assert_relative_eq!(to_f64(&total_mass(&engine)), 1e70, max_relative = 1e-12);
    }

    #[test]
    fn test_gaussian_bridge_conserves_mass() {
        // Between the cutoffs: force the bridge by lowering the small
        // cutoff below the particle count.
        let mut engine = build(
            OccupancyConfig::builder()
                .n_particles(1e6)
                .beta(1.0)
                .occupancy_size(30)
                .small_cutoff(10.0)
                .large_cutoff(1e30)
                .seed(11)
                .build()
                .unwrap(),
        );
        for _ in 0..10 {
            engine.advance().unwrap();
        }
        assert_relative_eq!(to_f64(&total_mass(&engine)), 1e6, max_relative = 1e-9);
    }

    #[test]
    fn test_symmetric_transport_spreads_binomially() {
        let mut engine = symmetric_transport(4.0, 10);
        engine.advance().unwrap();
        engine.advance().unwrap();
        // After two steps at bias 1/2: 4 × (1/4, 1/2, 1/4).
        let occupancy = engine.occupancy();
        assert_eq!(occupancy[0], one());
        assert_eq!(occupancy[1], real(2.0));
        assert_eq!(occupancy[2], one());
        assert_eq!(engine.min_idx(), 0);
        assert_eq!(engine.max_idx(), 2);
    }

    #[test]
    fn test_edges_grow_by_at_most_one_per_step() {
        let mut engine = discrete(1000.0, 50, 42);
        for _ in 0..20 {
            let (old_lo, old_hi) = (engine.min_idx(), engine.max_idx());
            engine.advance().unwrap();
            assert!(engine.min_idx() >= old_lo);
            assert!(engine.max_idx() <= old_hi + 1);
        }
    }

    #[test]
    fn test_boundary_contains_or_equals_previous_after_first_step() {
        let mut engine = discrete(1000.0, 50, 42);
        let (old_lo, old_hi) = (engine.min_idx(), engine.max_idx());
        engine.advance().unwrap();
        let contains = engine.min_idx() <= old_lo && engine.max_idx() >= old_hi;
        let unchanged = engine.min_idx() == old_lo && engine.max_idx() == old_hi;
        assert!(contains || unchanged);
    }

    #[test]
    fn test_capacity_exhaustion_and_resize() {
        let mut engine = discrete(1000.0, 3, 5);
        engine.advance().unwrap();
        engine.advance().unwrap();
        let err = engine.advance().unwrap_err();
        assert!(matches!(err, SimError::CapacityExhausted { .. }));

        engine.resize(10).unwrap();
        assert_eq!(engine.occupancy_size(), 13);
        engine.advance().unwrap();
        assert_eq!(total_mass(&engine), real(1000.0));
    }

    #[test]
    fn test_quenched_environment_caches_site_biases() {
        let mut engine = build(
            OccupancyConfig::builder()
                .n_particles(500.0)
                .beta(1.0)
                .occupancy_size(20)
                .static_environment(true)
                .seed(9)
                .build()
                .unwrap(),
        );
        engine.advance().unwrap();
        let cache = engine.site_biases();
        let first_visited: Vec<f64> = cache.iter().flatten().copied().collect();
        assert!(!first_visited.is_empty());

        engine.advance().unwrap();
        let cache_after = engine.site_biases();
        // Biases drawn at the first step are reused, never redrawn.
        for (before, after) in cache.iter().zip(cache_after.iter()) {
            if let Some(b) = before {
                assert_eq!(after.as_ref(), Some(b));
            }
        }
    }

    #[test]
    fn test_dynamic_environment_caches_nothing() {
        let mut engine = discrete(500.0, 20, 9);
        engine.advance().unwrap();
        assert!(engine.site_biases().iter().all(|b| b.is_none()));
    }

    #[test]
    fn test_find_quantiles_matches_individual_calls() {
        let mut engine = discrete(1_000_000.0, 60, 23);
        for _ in 0..30 {
            engine.advance().unwrap();
        }
        // Deliberately unsorted input.
        let qs: Vec<Real> = [500.0, 2.0, 100_000.0, 10.0]
            .iter()
            .map(|&q| real(q))
            .collect();
        let combined = engine.find_quantiles(&qs).unwrap();
        for (q, expected) in qs.iter().zip(combined.iter()) {
            assert_eq!(engine.find_quantile(q).unwrap(), *expected);
        }
    }

    #[test]
    fn test_nonpositive_quantile_rejected() {
        let engine = discrete(100.0, 10, 1);
        let err = engine.find_quantile(&zero()).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "quantile", .. }));
    }

    #[test]
    fn test_tail_probability_after_one_symmetric_step() {
        let mut engine = symmetric_transport(1000.0, 10);
        engine.advance().unwrap();
        // Half the mass moved to site 1.
        assert_eq!(engine.p_greater_than_x(0), real(0.5));
        assert_eq!(engine.p_greater_than_x(1), zero());
    }

    #[test]
    fn test_cdf_curve_is_monotone_and_starts_at_one() {
        let mut engine = symmetric_transport(1024.0, 20);
        for _ in 0..8 {
            engine.advance().unwrap();
        }
        let curve = engine.cdf();
        assert_eq!(curve[0], one());
        for pair in curve.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_positions_and_pdf_normalised() {
        let mut engine = symmetric_transport(1024.0, 20);
        for _ in 0..6 {
            engine.advance().unwrap();
        }
        let (positions, pdf) = engine.positions_and_pdf();
        assert_eq!(positions.len(), pdf.len());
        let total = pdf.iter().fold(zero(), |acc, v| acc + v);
        assert_eq!(total, one());
    }

    #[test]
    fn test_first_passage_times_deterministic_case() {
        let mut engine = symmetric_transport(1024.0, 40);
        // Threshold mass 1024/512 = 2: the tracked quantile rides the
        // leading edge, which advances one position per step.
        let times = engine
            .evolve_and_save_first_passage(&[1, 3], &[real(512.0)])
            .unwrap();
        assert_eq!(times, vec![vec![1], vec![3]]);
    }

    #[test]
    fn test_first_passage_monotone_in_position() {
        let mut engine = discrete(100_000.0, 200, 31);
        let times = engine
            .evolve_and_save_first_passage(&[2, 5, 9], &[real(1000.0)])
            .unwrap();
        assert!(times[0][0] <= times[1][0]);
        assert!(times[1][0] <= times[2][0]);
    }

    #[test]
    fn test_velocity_queries() {
        let mut engine = symmetric_transport(1024.0, 30);
        assert!(engine.velocity_curve(4).is_err());
        for _ in 0..10 {
            engine.advance().unwrap();
        }
        let curve = engine.velocity_curve(4).unwrap();
        assert_eq!(curve.len(), 4);
        for (v, p) in &curve {
            assert!((0.0..=1.0).contains(v));
            assert!(p >= &zero());
            assert!(p <= &one());
        }
        let (v, p) = engine.velocity_point(0.5).unwrap();
        assert_eq!(v, 0.5);
        assert!(p <= one());
        assert!(engine.velocity_point(1.5).is_err());
    }

    #[test]
    fn test_gumbel_variance_smoke() {
        let mut engine = discrete(10_000.0, 60, 3);
        for _ in 0..25 {
            engine.advance().unwrap();
        }
        let var = engine.gumbel_variance(&real(100.0), &GumbelStats).unwrap();
        assert!(to_f64(&var) >= 0.0);
    }

    #[test]
    fn test_snapshot_accessors_are_copies() {
        let mut engine = discrete(1000.0, 20, 13);
        engine.advance().unwrap();
        let mut snapshot = engine.occupancy();
        snapshot[0] = real(123.0);
        // Mutating the copy must not touch engine state.
        assert_ne!(engine.occupancy()[0], real(123.0));
    }

    #[test]
    fn test_set_occupancy_validation() {
        let mut engine = discrete(10.0, 5, 1);
        let err = engine.set_occupancy(&[zero(), zero(), zero()]).unwrap_err();
        assert!(matches!(err, SimError::LengthMismatch { .. }));

        let bad = vec![real(-1.0), zero(), zero(), zero(), zero()];
        let err = engine.set_occupancy(&bad).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "occupancy", .. }));

        let good = vec![real(10.0), zero(), zero(), zero(), zero()];
        engine.set_occupancy(&good).unwrap();
        assert_eq!(engine.occupancy()[0], real(10.0));
    }

    #[test]
    fn test_cutoff_setters_validated() {
        let mut engine = discrete(10.0, 5, 1);
        assert!(engine.set_small_cutoff(1e70).is_err());
        engine.set_small_cutoff(1024.0).unwrap();
        assert_eq!(engine.small_cutoff(), 1024.0);
        assert!(engine.set_large_cutoff(10.0).is_err());
        engine.set_large_cutoff(1e40).unwrap();
        assert_eq!(engine.large_cutoff(), 1e40);
    }
}
