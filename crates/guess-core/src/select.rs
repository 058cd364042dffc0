//! Next-question selection: focus, global, fallback and last-resort phases.

use crate::belief::BeliefState;
use crate::catalog::{Catalog, Identity};
use crate::info::{Evaluator, varies};
use crate::params::{GameParams, QuestionStrategy};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::index;
use tracing::{Level, event};

/// Phase of [`QuestionSelector::next_question`] that produced the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Focus,
    Global,
    Fallback,
    LastResort,
}

impl SelectionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionPhase::Focus => "focus",
            SelectionPhase::Global => "global",
            SelectionPhase::Fallback => "fallback",
            SelectionPhase::LastResort => "last_resort",
        }
    }
}

/// Chooses which attribute to ask next.
#[derive(Debug, Clone, Copy)]
pub struct QuestionSelector<'a> {
    catalog: &'a Catalog,
    params: &'a GameParams,
}

impl<'a> QuestionSelector<'a> {
    pub fn new(catalog: &'a Catalog, params: &'a GameParams) -> Self {
        Self { catalog, params }
    }

    /// Next attribute to ask, or `None` when nothing is left to ask or no one is left.
    pub fn next_question(&self, belief: &BeliefState) -> Option<&'a str> {
        self.select(belief).map(|(attribute, _)| attribute)
    }

    /// Like [`Self::next_question`] but also reports which phase decided.
    pub fn select(&self, belief: &BeliefState) -> Option<(&'a str, SelectionPhase)> {
        let unasked: Vec<&'a str> = self
            .catalog
            .attributes()
            .iter()
            .map(String::as_str)
            .filter(|attribute| !belief.has_asked(attribute))
            .collect();
        if unasked.is_empty() {
            return None;
        }

        let active: Vec<&str> = belief.active().map(|(name, _)| name).collect();
        if active.is_empty() {
            return None;
        }

        let pool = self.evaluation_pool(&unasked, belief.question_count());
        let evaluator = Evaluator::new(self.catalog, belief);

        let chosen = self
            .focus(belief, &evaluator, &pool)
            .map(|attribute| (attribute, SelectionPhase::Focus))
            .or_else(|| {
                self.evaluate(&evaluator, &active, &pool)
                    .map(|attribute| (attribute, SelectionPhase::Global))
            })
            .or_else(|| {
                let members: Vec<&Identity> = active
                    .iter()
                    .filter_map(|name| self.catalog.identity(name))
                    .collect();
                unasked
                    .iter()
                    .copied()
                    .find(|attribute| varies(&members, attribute))
                    .map(|attribute| (attribute, SelectionPhase::Fallback))
            })
            .unwrap_or((unasked[0], SelectionPhase::LastResort));

        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "guess_core::select",
                Level::DEBUG,
                attribute = chosen.0,
                phase = chosen.1.as_str(),
                strategy = self.params.strategy.as_str(),
                question = belief.question_count(),
                active = active.len() as u32,
                pool = pool.len() as u32,
            );
        }
        Some(chosen)
    }

    fn focus(
        &self,
        belief: &BeliefState,
        evaluator: &Evaluator<'_>,
        pool: &[&'a str],
    ) -> Option<&'a str> {
        if belief.question_count() <= self.params.soft_elimination_threshold {
            return None;
        }
        let top: Vec<&str> = belief
            .top_candidates(self.params.top_k_focus)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        if top.len() < 2 {
            return None;
        }
        self.evaluate(evaluator, &top, pool)
    }

    fn evaluate(
        &self,
        evaluator: &Evaluator<'_>,
        candidates: &[&str],
        pool: &[&'a str],
    ) -> Option<&'a str> {
        match self.params.strategy {
            QuestionStrategy::EntropyFull | QuestionStrategy::EntropySampled => evaluator
                .best_by_information_gain(
                    candidates,
                    pool,
                    self.params.min_questions_before_guess,
                ),
            QuestionStrategy::SplitBalance => evaluator.best_by_split_balance(candidates, pool),
        }
    }

    /// Attributes the ranking phases may consider; a seeded sample for `EntropySampled`.
    fn evaluation_pool(&self, unasked: &[&'a str], question_count: u32) -> Vec<&'a str> {
        if self.params.strategy != QuestionStrategy::EntropySampled {
            return unasked.to_vec();
        }
        let wanted = (unasked.len() as f64 * self.params.attribute_sample_ratio).ceil() as usize;
        let amount = wanted
            .max(self.params.min_attributes_to_sample)
            .min(unasked.len());
        if amount == unasked.len() {
            return unasked.to_vec();
        }

        let seed = self.params.sample_seed
            ^ u64::from(question_count).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut picked = index::sample(&mut rng, unasked.len(), amount).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|position| unasked[position]).collect()
    }
}
