//! Occupancy (particle-count) simulation engine.
//!
//! Where the CDF side evolves a probability recurrence, this engine pushes
//! explicit per-site mass through the lattice. The support of the
//! distribution is tracked step by step (the *edges*), so each step costs
//! O(active width) rather than O(allocated width), and the per-site
//! transfer switches between a genuinely stochastic discrete regime at low
//! counts and a deterministic continuous regime at very high counts.

mod config;
mod engine;

pub use config::{
    OccupancyConfig, OccupancyConfigBuilder, LARGE_CUTOFF_DEFAULT, SMALL_CUTOFF_DEFAULT,
};
pub use engine::OccupancyEngine;
