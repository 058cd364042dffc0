//! Turn-by-turn driver for a single game.

use crate::belief::telemetry::BeliefMetrics;
use crate::belief::{Answer, BeliefState, UpdateOutcome};
use crate::catalog::Catalog;
use crate::error::GameError;
use crate::game::serialization::BeliefSnapshot;
use crate::guess::{GuessPolicy, Verdict};
use crate::params::GameParams;
use crate::select::QuestionSelector;
use tracing::{Level, event};

/// Why a game ended without a confirmed guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// The answers contradict every identity in the catalog.
    NoMatch,
    /// Candidates may remain but nothing left to ask separates them.
    Stumped,
}

impl Finish {
    pub fn as_str(self) -> &'static str {
        match self {
            Finish::NoMatch => "no_match",
            Finish::Stumped => "stumped",
        }
    }
}

/// What the host should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn<'c> {
    Ask(&'c str),
    Guess {
        name: String,
        confidence: f64,
        exhausted_questions: bool,
    },
    Finished(Finish),
}

/// One game in progress. The catalog and parameters are shared; the belief state is owned.
#[derive(Debug, Clone)]
pub struct Game<'c> {
    catalog: &'c Catalog,
    params: &'c GameParams,
    state: BeliefState,
}

impl<'c> Game<'c> {
    pub fn new(catalog: &'c Catalog, params: &'c GameParams) -> Result<Self, GameError> {
        Self::resume(catalog, params, BeliefState::new(catalog))
    }

    /// Continues a game from a state reloaded by the host.
    pub fn resume(
        catalog: &'c Catalog,
        params: &'c GameParams,
        state: BeliefState,
    ) -> Result<Self, GameError> {
        params.validate()?;
        Ok(Self {
            catalog,
            params,
            state,
        })
    }

    /// Consults the guess policy, then the selector when more questions are needed.
    pub fn next_turn(&self) -> Turn<'c> {
        let turn = match GuessPolicy::new(self.catalog, self.params).evaluate(&self.state) {
            Verdict::Guess {
                name,
                confidence,
                exhausted_questions,
            } => Turn::Guess {
                name,
                confidence,
                exhausted_questions,
            },
            Verdict::NoMatch => Turn::Finished(Finish::NoMatch),
            Verdict::Stumped => Turn::Finished(Finish::Stumped),
            Verdict::AskMore => QuestionSelector::new(self.catalog, self.params)
                .next_question(&self.state)
                .map(Turn::Ask)
                .unwrap_or(Turn::Finished(Finish::Stumped)),
        };

        if tracing::enabled!(Level::DEBUG) {
            let metrics = BeliefMetrics::from_state(&self.state);
            event!(
                target: "guess_core::game",
                Level::DEBUG,
                question = metrics.question_count,
                remaining = metrics.remaining as u32,
                entropy_bits = metrics.entropy_bits,
                leader = metrics.leader.as_deref().unwrap_or("-"),
                leader_probability = metrics.leader_probability,
                turn = ?turn,
            );
        }
        turn
    }

    pub fn answer(
        &mut self,
        attribute: &str,
        answer: Answer,
    ) -> Result<UpdateOutcome, GameError> {
        self.state
            .apply_answer(self.catalog, self.params, attribute, answer)
    }

    /// Penalizes a guess the player rejected so play can continue among the others.
    pub fn reject_guess(&mut self, name: &str) -> Result<(), GameError> {
        if self
            .state
            .penalize_wrong_guess(name, self.params.wrong_guess_penalty)
        {
            Ok(())
        } else {
            Err(GameError::UnknownIdentity(name.to_string()))
        }
    }

    pub fn top_candidates(&self, k: usize) -> Vec<(&str, f64)> {
        self.state.top_candidates(k)
    }

    pub fn metrics(&self) -> BeliefMetrics {
        BeliefMetrics::from_state(&self.state)
    }

    pub fn snapshot(&self) -> BeliefSnapshot {
        BeliefSnapshot::capture(&self.state)
    }

    pub fn state(&self) -> &BeliefState {
        &self.state
    }

    pub fn into_state(self) -> BeliefState {
        self.state
    }
}
