//! Decides whether the belief is sharp enough to name an identity.

use crate::belief::BeliefState;
use crate::catalog::Catalog;
use crate::params::GameParams;

/// Minimum probability for an identity to be offered as a guess at all.
const PLAUSIBLE: f64 = 0.01;

/// Decision produced by [`GuessPolicy::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Name `name` with the displayed `confidence`.
    Guess {
        name: String,
        confidence: f64,
        /// Set when every attribute has been asked and the guess is a best effort.
        exhausted_questions: bool,
    },
    /// No identity is consistent with the answers.
    NoMatch,
    /// Every question was asked and no plausible candidate remains.
    Stumped,
    AskMore,
}

impl Verdict {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Verdict::NoMatch | Verdict::Stumped)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GuessPolicy<'a> {
    catalog: &'a Catalog,
    params: &'a GameParams,
}

impl<'a> GuessPolicy<'a> {
    pub fn new(catalog: &'a Catalog, params: &'a GameParams) -> Self {
        Self { catalog, params }
    }

    pub fn evaluate(&self, belief: &BeliefState) -> Verdict {
        let remaining = belief.remaining();
        let leader = belief.leader();
        let questions = belief.question_count();

        if remaining == 0 && questions > 0 {
            return Verdict::NoMatch;
        }

        if let Some((name, probability)) = leader {
            let confident = probability >= self.params.certainty_threshold
                || (remaining == 1 && probability > PLAUSIBLE);
            if questions >= self.params.min_questions_before_guess && confident {
                return Verdict::Guess {
                    name: name.to_string(),
                    confidence: if remaining == 1 { 1.0 } else { probability },
                    exhausted_questions: false,
                };
            }
        }

        if belief.asked().len() >= self.catalog.attributes().len() {
            return match leader {
                Some((name, probability)) if probability > PLAUSIBLE => Verdict::Guess {
                    name: name.to_string(),
                    confidence: probability,
                    exhausted_questions: true,
                },
                _ => Verdict::Stumped,
            };
        }

        Verdict::AskMore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::Answer;
    use crate::catalog::Identity;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Identity::new("X", [("a", true), ("b", false), ("c", true)]),
            Identity::new("Y", [("a", false), ("b", true), ("c", true)]),
            Identity::new("Z", [("a", true), ("b", true), ("c", false)]),
        ])
        .expect("catalog")
    }

    #[test]
    fn asks_more_before_minimum_questions() {
        let catalog = catalog();
        let params = GameParams::default();
        let policy = GuessPolicy::new(&catalog, &params);
        assert_eq!(policy.evaluate(&BeliefState::new(&catalog)), Verdict::AskMore);
    }

    #[test]
    fn single_survivor_is_guessed_with_full_confidence() {
        let catalog = catalog();
        let params = GameParams {
            soft_elimination_threshold: 0,
            min_questions_before_guess: 2,
            ..GameParams::default()
        };
        let mut belief = BeliefState::new(&catalog);
        belief.apply_answer(&catalog, &params, "a", Answer::Yes).unwrap();
        belief.apply_answer(&catalog, &params, "b", Answer::Yes).unwrap();

        let verdict = GuessPolicy::new(&catalog, &params).evaluate(&belief);
        assert_eq!(
            verdict,
            Verdict::Guess {
                name: "Z".into(),
                confidence: 1.0,
                exhausted_questions: false,
            }
        );
    }

    #[test]
    fn contradiction_reports_no_match() {
        let catalog = catalog();
        let params = GameParams {
            soft_elimination_threshold: 0,
            ..GameParams::default()
        };
        let mut belief = BeliefState::new(&catalog);
        belief.apply_answer(&catalog, &params, "c", Answer::No).unwrap();
        belief.apply_answer(&catalog, &params, "a", Answer::No).unwrap();

        let verdict = GuessPolicy::new(&catalog, &params).evaluate(&belief);
        assert_eq!(verdict, Verdict::NoMatch);
        assert!(verdict.is_terminal());
    }

    #[test]
    fn all_questions_asked_forces_best_effort_guess() {
        let catalog = catalog();
        let params = GameParams::default();
        let mut belief = BeliefState::new(&catalog);
        for (attribute, answer) in [("a", Answer::Yes), ("b", Answer::Yes), ("c", Answer::No)] {
            belief
                .apply_answer(&catalog, &params, attribute, answer)
                .unwrap();
        }

        match GuessPolicy::new(&catalog, &params).evaluate(&belief) {
            Verdict::Guess {
                name,
                exhausted_questions,
                ..
            } => {
                assert_eq!(name, "Z");
                assert!(exhausted_questions);
            }
            other => panic!("expected a guess, got {other:?}"),
        }
    }
}
