//! Probabilistic belief tracking over catalog identities.
//!
//! This module is composed of:
//! - `state`: the per-game distribution, asked set, question counter and regime.
//! - `soft`: early-phase multiplicative down-weighting of mismatches.
//! - `hard`: later-phase strict elimination of mismatches.
//! - `update`: regime dispatch and renormalization for one answer.
//! - `telemetry`: entropy and leader metrics for logging.

mod hard;
pub mod soft;
mod state;
pub mod telemetry;
mod update;

pub use hard::eliminate_mismatches;
pub use state::{Answer, BeliefState, Regime};
pub use update::UpdateOutcome;
