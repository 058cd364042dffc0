//! Applies an answer to the belief state under the regime in force.

use super::hard::eliminate_mismatches;
use super::soft::{SoftConfig, SoftLikelihoodModel};
use super::{Answer, BeliefState, Regime};
use crate::catalog::Catalog;
use crate::error::GameError;
use crate::params::GameParams;
use tracing::{Level, event};

/// Result of applying one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The distribution was renormalized and sums to one.
    Updated,
    /// No identity in the catalog is consistent with the answers so far.
    Contradiction,
}

impl BeliefState {
    /// Records the question and updates probabilities from the answer.
    ///
    /// Unknown attributes are rejected before any mutation. On contradiction the
    /// probabilities are left unnormalized (all near zero) and the game is over.
    pub fn apply_answer(
        &mut self,
        catalog: &Catalog,
        params: &GameParams,
        attribute: &str,
        answer: Answer,
    ) -> Result<UpdateOutcome, GameError> {
        if !catalog.contains_attribute(attribute) {
            return Err(GameError::InvalidAttribute(attribute.to_string()));
        }
        if self.is_exhausted() {
            return Ok(UpdateOutcome::Contradiction);
        }

        let regime = self.record_question(attribute, params.soft_elimination_threshold);
        match regime {
            Regime::Soft => SoftLikelihoodModel::new(SoftConfig::from_params(params))
                .apply(self, catalog, attribute, answer),
            Regime::Hard => eliminate_mismatches(self, catalog, attribute, answer),
        }

        if !self.normalize() {
            event!(
                target: "guess_core::update",
                Level::INFO,
                attribute,
                answer = answer.as_bool(),
                question = self.question_count(),
                "contradiction"
            );
            return Ok(UpdateOutcome::Contradiction);
        }

        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "guess_core::update",
                Level::DEBUG,
                attribute,
                answer = answer.as_bool(),
                question = self.question_count(),
                regime = regime.as_str(),
                remaining = self.remaining() as u32,
            );
        }
        Ok(UpdateOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Identity;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Identity::new("X", [("a", true), ("b", false)]),
            Identity::new("Y", [("a", false), ("b", true)]),
            Identity::new("Z", [("a", true), ("b", true)]),
        ])
        .expect("catalog")
    }

    #[test]
    fn unknown_attribute_leaves_state_untouched() {
        let catalog = catalog();
        let mut state = BeliefState::new(&catalog);
        let before = state.clone();

        let err = state
            .apply_answer(&catalog, &GameParams::default(), "c", Answer::Yes)
            .unwrap_err();

        assert_eq!(err, GameError::InvalidAttribute("c".into()));
        assert_eq!(state, before);
    }

    #[test]
    fn soft_regime_covers_first_threshold_answers() {
        let catalog = catalog();
        let params = GameParams::default();
        let mut state = BeliefState::new(&catalog);

        for _ in 0..params.soft_elimination_threshold {
            state.apply_answer(&catalog, &params, "a", Answer::No).unwrap();
            assert_eq!(state.regime(), Regime::Soft);
        }
        state.apply_answer(&catalog, &params, "b", Answer::Yes).unwrap();
        assert_eq!(state.question_count(), params.soft_elimination_threshold + 1);
        assert_eq!(state.regime(), Regime::Hard);
        assert_eq!(state.probability("X"), 0.0);
    }

    #[test]
    fn counts_and_asked_set_grow_per_answer() {
        let catalog = catalog();
        let params = GameParams::default();
        let mut state = BeliefState::new(&catalog);

        state.apply_answer(&catalog, &params, "a", Answer::Yes).unwrap();
        state.apply_answer(&catalog, &params, "a", Answer::Yes).unwrap();

        assert_eq!(state.question_count(), 2);
        assert_eq!(state.asked().len(), 1);
        assert!(state.has_asked("a"));
    }

    #[test]
    fn exhausted_state_is_not_advanced() {
        let catalog = catalog();
        let params = GameParams {
            soft_elimination_threshold: 0,
            ..GameParams::default()
        };
        let mut state = BeliefState::new(&catalog);
        state.apply_answer(&catalog, &params, "a", Answer::No).unwrap();
        let outcome = state.apply_answer(&catalog, &params, "b", Answer::No).unwrap();
        assert_eq!(outcome, UpdateOutcome::Contradiction);
        assert_eq!(state.question_count(), 2);

        let again = state.apply_answer(&catalog, &params, "a", Answer::Yes).unwrap();
        assert_eq!(again, UpdateOutcome::Contradiction);
        assert_eq!(state.question_count(), 2);
    }
}
