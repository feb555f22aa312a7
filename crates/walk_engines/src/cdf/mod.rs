//! Cumulative-distribution recurrence engines.
//!
//! The tail recurrence evolves, one unit time step at a time, the array
//! Z(n, t) indexed by the reduced coordinate n (lattice position
//! x = 2n − t). Slot 0 is pinned to 1 and every other slot receives a
//! disorder-weighted convex combination of its two predecessors, with a
//! fresh bias draw per slot per step.
//!
//! Two views are offered over the same recurrence:
//! - [`TimeCdfEngine`]: snapshot view. Advance, then query quantiles,
//!   velocity or extreme-value variance at the current time.
//! - [`PositionCdfEngine`]: trajectory view. A fixed set of target
//!   quantiles whose crossing positions are recorded at every step.

mod config;
mod position;
mod recurrence;
mod time;

pub use config::{TimeCdfConfig, TimeCdfConfigBuilder, MAX_HORIZON};
pub use position::PositionCdfEngine;
pub use time::TimeCdfEngine;
