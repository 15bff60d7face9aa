//! Matchup simulation engine.
//!
//! - [`rating`]: efficiency ratings → per-possession scoring rates
//! - [`sampler`]: Box-Muller normal variates
//! - [`simulator`]: one trial (8 segments + overtime)
//! - [`ensemble`]: N trials → aggregate probabilities
//! - [`market`]: spread / total coverage over the trials

pub mod ensemble;
pub mod market;
pub mod rating;
pub mod sampler;
pub mod simulator;

pub use ensemble::{simulate, simulate_with_cancel, MAX_ITERATIONS};
pub use market::{analyze_market, parse_spread};
