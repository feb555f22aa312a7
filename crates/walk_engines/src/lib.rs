//! # walk_engines: Recurrence engines for walks in random environments
//!
//! ## Engine Layer Role
//!
//! walk_engines is the kernel of the workspace. It provides two
//! complementary representations of the same physical process, a directed
//! lattice walk whose step bias is redrawn from a symmetric Beta law at
//! every site:
//!
//! - [`cdf::TimeCdfEngine`] and [`cdf::PositionCdfEngine`] evolve the
//!   cumulative tail recurrence one time step at a time at extended
//!   precision (snapshot view and trajectory view respectively).
//! - [`occupancy::OccupancyEngine`] evolves explicit per-site particle
//!   mass with an active-boundary optimisation and a dual
//!   discrete/continuous transfer regime.
//!
//! Both sides expose tail-quantile extraction and delegate extreme-value
//! variance estimation to a [`walk_core::ExtremeValueStats`] collaborator.
//!
//! ## Ownership Model
//!
//! Every engine exclusively owns its arrays and its [`bias::BiasSource`];
//! a step is computed in full before any state is replaced, and no
//! operation suspends. There is no sharing between engine instances.
//!
//! ## Usage Example
//!
//! ```rust
//! use walk_engines::cdf::{TimeCdfConfig, TimeCdfEngine};
//! use walk_core::real::real;
//!
//! let config = TimeCdfConfig::builder()
//!     .beta(1.0)
//!     .t_max(100)
//!     .seed(42)
//!     .build()
//!     .expect("valid configuration");
//! let mut engine = TimeCdfEngine::new(config).expect("valid engine");
//!
//! for _ in 0..100 {
//!     engine.advance().expect("within horizon");
//! }
//! let position = engine.find_quantile(&real(1e12)).expect("crossing exists");
//! assert!(position.abs() <= 102);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bias;
pub mod cdf;
pub mod occupancy;

pub use bias::BiasSource;
pub use cdf::{PositionCdfEngine, TimeCdfConfig, TimeCdfEngine};
pub use occupancy::{OccupancyConfig, OccupancyEngine};
