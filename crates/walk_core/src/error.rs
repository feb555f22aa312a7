//! Error types for structured error handling.
//!
//! This module provides `SimError`, the failure taxonomy shared by both
//! recurrence engines and the statistics collaborator. Conditions that
//! are easy to leave undefined in this kind of simulation (an exhausted
//! quantile search, a run outgrowing its preallocated arrays) are
//! explicit variants here rather than silent sentinel values.

use thiserror::Error;

/// Categorised simulation errors.
///
/// Provides structured error handling for engine construction, evolution
/// and queries with descriptive context for each failure mode.
///
/// # Variants
/// - `InvalidParameter`: shape parameter, cutoff, quantile or count outside
///   its allowed range
/// - `QuantileNotFound`: descending tail search completed without a crossing
/// - `HorizonExceeded`: a step was requested past the configured horizon
/// - `CapacityExhausted`: occupancy or edge storage too small for the step
/// - `LengthMismatch`: paired sequences of unequal length
///
/// # Examples
/// ```
/// use walk_core::error::SimError;
///
/// let err = SimError::InvalidParameter {
///     name: "beta",
///     value: "-1 (must be >= 0)".to_string(),
/// };
/// assert!(err.to_string().contains("beta"));
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimError {
    /// Parameter outside its allowed range.
    ///
    /// Also covers quantile values ≤ 0, which are rejected here before they
    /// can reach the 1/q division inside a search.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },

    /// Descending tail search exhausted without any slot exceeding the
    /// threshold.
    #[error("No crossing found for quantile {quantile}")]
    QuantileNotFound {
        /// The quantile that failed to resolve.
        quantile: String,
    },

    /// A time step was requested beyond the configured horizon.
    #[error("Time horizon exhausted: t_max = {t_max}")]
    HorizonExceeded {
        /// The configured horizon.
        t_max: usize,
    },

    /// Occupancy or edge storage cannot hold the next step.
    #[error("Capacity exhausted: step needs {needed} slots, {capacity} allocated (resize first)")]
    CapacityExhausted {
        /// Slots the step would touch.
        needed: usize,
        /// Slots currently allocated.
        capacity: usize,
    },

    /// Paired sequences of unequal length.
    #[error("Length mismatch: {left} elements vs {right}")]
    LengthMismatch {
        /// Length of the first sequence.
        left: usize,
        /// Length of the second sequence.
        right: usize,
    },
}

/// Result alias used across the workspace.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SimError::QuantileNotFound {
            quantile: "1e50".to_string(),
        };
        assert!(err.to_string().contains("1e50"));

        let err = SimError::HorizonExceeded { t_max: 100 };
        assert!(err.to_string().contains("100"));

        let err = SimError::CapacityExhausted {
            needed: 51,
            capacity: 50,
        };
        assert!(err.to_string().contains("resize"));
    }
}
