//! Shared state machine behind the two CDF engine views.
//!
//! Both engines compose this type rather than inheriting from a common
//! base: it owns the recurrence arrays and the scan algorithms, while the
//! bias source is passed in per step so that seeding stays under the
//! owning engine's control.

use std::cmp::Ordering;

use walk_core::error::{SimError, SimResult};
use walk_core::real::{one, real, zero, Real};

use crate::bias::BiasSource;

/// The tail recurrence Z(n, t) with its preallocated double buffer.
///
/// Capacity is `t_max + 2` slots. At time t the slots 0..=t+1 form the
/// meaningful prefix: 0..=t hold the evolved values and slot t+1 reads 0,
/// which is exact (the walk cannot have taken more than t right-steps).
/// Both buffers start zeroed and every step writes one slot further than
/// the last, so slots beyond the prefix are always exactly 0 and are never
/// consulted by any query.
#[derive(Debug)]
pub(crate) struct CdfRecurrence {
    cdf: Vec<Real>,
    scratch: Vec<Real>,
    t: usize,
    t_max: usize,
}

impl CdfRecurrence {
    pub(crate) fn new(t_max: usize) -> Self {
        let capacity = t_max + 2;
        let mut cdf = vec![zero(); capacity];
        cdf[0] = one();
        Self {
            cdf,
            scratch: vec![zero(); capacity],
            t: 0,
            t_max,
        }
    }

    #[inline]
    pub(crate) fn time(&self) -> usize {
        self.t
    }

    #[inline]
    pub(crate) fn t_max(&self) -> usize {
        self.t_max
    }

    /// One unit time step of the recurrence.
    ///
    /// The whole next array is computed from the old one before the buffers
    /// are swapped and t is incremented, so a step is atomic. One fresh
    /// bias is drawn per slot n ≥ 1; slot 0 stays pinned to 1 and the new
    /// leading edge n = t+1 receives bias × old[t].
    pub(crate) fn advance(&mut self, bias: &mut BiasSource) -> SimResult<()> {
        if self.t >= self.t_max {
            return Err(SimError::HorizonExceeded { t_max: self.t_max });
        }
        let t = self.t;
        self.scratch[0] = one();
        for n in 1..=t + 1 {
            let b = real(bias.draw());
            self.scratch[n] = if n == t + 1 {
                &b * &self.cdf[n - 1]
            } else {
                &b * &self.cdf[n - 1] + (one() - &b) * &self.cdf[n]
            };
        }
        std::mem::swap(&mut self.cdf, &mut self.scratch);
        self.t += 1;
        Ok(())
    }

    /// Validates a quantile and returns the 1/q scan threshold.
    fn threshold(q: &Real) -> SimResult<Real> {
        if !(q > &zero()) {
            return Err(SimError::InvalidParameter {
                name: "quantile",
                value: format!("{q} (must be > 0)"),
            });
        }
        Ok(one() / q)
    }

    /// Descending scan for the first slot exceeding 1/q.
    ///
    /// Returns the reduced coordinate of the crossing. The scan relies on
    /// the maintained prefix being non-increasing in n at fixed t.
    pub(crate) fn find_crossing(&self, q: &Real) -> SimResult<usize> {
        let threshold = Self::threshold(q)?;
        for n in (0..=self.t).rev() {
            if self.cdf[n] > threshold {
                return Ok(n);
            }
        }
        Err(SimError::QuantileNotFound {
            quantile: q.to_string(),
        })
    }

    /// Lattice position reported for a crossing at reduced coordinate n.
    #[inline]
    pub(crate) fn crossing_position(&self, n: usize) -> i64 {
        2 * n as i64 + 2 - self.t as i64
    }

    /// Resolves many quantiles in one combined descending scan.
    ///
    /// The quantiles are ordered internally (ascending threshold), the scan
    /// retires them as it walks down from n = t, and the results are
    /// written back in the caller's input order: O(t + len) instead of
    /// O(t × len), with output identical to per-element [`Self::find_crossing`].
    pub(crate) fn find_crossings(&self, qs: &[Real]) -> SimResult<Vec<i64>> {
        if qs.is_empty() {
            return Ok(Vec::new());
        }
        let thresholds: Vec<Real> = qs.iter().map(Self::threshold).collect::<SimResult<_>>()?;
        let mut order: Vec<usize> = (0..qs.len()).collect();
        order.sort_by(|&a, &b| {
            thresholds[a]
                .partial_cmp(&thresholds[b])
                .unwrap_or(Ordering::Equal)
        });

        let mut positions = vec![0_i64; qs.len()];
        let mut resolved = 0;
        'scan: for n in (0..=self.t).rev() {
            while self.cdf[n] > thresholds[order[resolved]] {
                positions[order[resolved]] = self.crossing_position(n);
                resolved += 1;
                if resolved == order.len() {
                    break 'scan;
                }
            }
        }
        if resolved < order.len() {
            return Err(SimError::QuantileNotFound {
                quantile: qs[order[resolved]].to_string(),
            });
        }
        Ok(positions)
    }

    #[inline]
    pub(crate) fn value(&self, n: usize) -> &Real {
        &self.cdf[n]
    }

    /// Lattice positions 2n − t for the evolved slots 0..=t.
    pub(crate) fn positions(&self) -> Vec<i64> {
        let t = self.t as i64;
        (0..=self.t).map(|n| 2 * n as i64 - t).collect()
    }

    /// The completed tail curve handed to the statistics collaborator:
    /// slots 0..=t paired with their positions, plus a trailing 0 one
    /// lattice step past the leading edge.
    pub(crate) fn tail_curve(&self) -> (Vec<i64>, Vec<Real>) {
        let t = self.t as i64;
        let mut support = self.positions();
        support.push(2 * (self.t as i64 + 1) - t);
        let mut probs = self.cdf[..=self.t].to_vec();
        probs.push(zero());
        (support, probs)
    }

    /// Copy of the meaningful prefix, slots 0..=t+1.
    pub(crate) fn snapshot(&self) -> Vec<Real> {
        self.cdf[..=self.t + 1].to_vec()
    }

    /// Replaces the recurrence array with an externally held snapshot.
    ///
    /// The remainder of both buffers is zeroed so the stale-tail invariant
    /// holds for every later step and query.
    pub(crate) fn restore(&mut self, values: &[Real]) -> SimResult<()> {
        if values.is_empty() {
            return Err(SimError::InvalidParameter {
                name: "cdf",
                value: "empty snapshot".to_string(),
            });
        }
        if values.len() > self.cdf.len() {
            return Err(SimError::CapacityExhausted {
                needed: values.len(),
                capacity: self.cdf.len(),
            });
        }
        if values[0] != one() {
            return Err(SimError::InvalidParameter {
                name: "cdf",
                value: "slot 0 must equal 1".to_string(),
            });
        }
        for (slot, v) in self.cdf.iter_mut().zip(values.iter()) {
            *slot = v.clone();
        }
        for slot in self.cdf.iter_mut().skip(values.len()) {
            *slot = zero();
        }
        for slot in self.scratch.iter_mut() {
            *slot = zero();
        }
        Ok(())
    }

    pub(crate) fn set_time(&mut self, t: usize) -> SimResult<()> {
        if t > self.t_max {
            return Err(SimError::InvalidParameter {
                name: "time",
                value: format!("{t} (must be <= t_max = {})", self.t_max),
            });
        }
        self.t = t;
        Ok(())
    }
}
