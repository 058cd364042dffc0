#![deny(warnings)]
//! Belief-driven engine for a yes/no "guess the person" game.
//!
//! A [`catalog::Catalog`] of identities is loaded once and shared. Each game owns a
//! [`belief::BeliefState`] that the host reloads before, and persists after, every call.

pub mod belief;
pub mod catalog;
pub mod error;
pub mod game;
pub mod guess;
pub mod info;
pub mod params;
pub mod select;

pub use belief::{Answer, BeliefState, Regime, UpdateOutcome};
pub use catalog::{Catalog, Identity};
pub use error::GameError;
pub use game::{BeliefSnapshot, Finish, Game, Turn};
pub use guess::{GuessPolicy, Verdict};
pub use params::{GameParams, QuestionStrategy};
pub use select::QuestionSelector;

/// Probabilities at or below this are treated as zero throughout.
pub const EPSILON: f64 = 1e-9;
