//! # walk_core: Foundation for the driftwalk simulation library
//!
//! ## Foundation Layer Role
//!
//! walk_core is the bottom layer of the two-crate workspace, providing:
//! - The extended-precision numeric alias `Real` (`real`)
//! - Error types: `SimError` (`error`)
//! - The extreme-value statistics collaborator: `ExtremeValueStats`,
//!   `GumbelStats` (`stats`)
//!
//! ## Zero Dependency Principle
//!
//! The foundation layer has no dependency on the engine crate, with minimal
//! external dependencies:
//! - dashu-float: pure-Rust big float backing the `Real` alias
//! - thiserror: structured error derivation
//! - serde: serialisation support (optional)
//!
//! ## Usage Example
//!
//! ```rust
//! use walk_core::real::{one, real, to_f64, Real};
//!
//! let half: Real = real(0.5);
//! let sum = &half + &half;
//! assert_eq!(sum, one());
//! assert_eq!(to_f64(&sum), 1.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for [`SimError`] and the configuration
//!   types downstream

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod real;
pub mod stats;

pub use error::{SimError, SimResult};
pub use real::Real;
pub use stats::{ExtremeValueStats, GumbelStats};
