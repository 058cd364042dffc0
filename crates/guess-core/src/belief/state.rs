//! Per-game belief state and its invariants.

use crate::EPSILON;
use crate::catalog::Catalog;
use crate::error::GameError;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// A yes/no reply to an attribute question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    No,
    Yes,
}

impl Answer {
    pub fn as_bool(self) -> bool {
        matches!(self, Answer::Yes)
    }

    /// Whether an identity holding `value` for the asked attribute agrees with this answer.
    pub fn matches(self, value: bool) -> bool {
        self.as_bool() == value
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        if value { Answer::Yes } else { Answer::No }
    }
}

impl TryFrom<u8> for Answer {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Answer::No),
            1 => Ok(Answer::Yes),
            other => Err(GameError::InvalidAnswer(other)),
        }
    }
}

/// Update rule in force for the answer being applied.
///
/// The transition is one-way: once a game reaches `Hard` it never returns to `Soft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    Soft,
    Hard,
}

impl Regime {
    /// Regime for an answer whose post-increment question count is `count`.
    pub fn for_count(count: u32, soft_threshold: u32) -> Self {
        if count <= soft_threshold {
            Regime::Soft
        } else {
            Regime::Hard
        }
    }

    pub(crate) fn advance(self, count: u32, soft_threshold: u32) -> Self {
        match self {
            Regime::Hard => Regime::Hard,
            Regime::Soft => Self::for_count(count, soft_threshold),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Regime::Soft => "soft",
            Regime::Hard => "hard",
        }
    }
}

/// Probability distribution over identities plus question bookkeeping for one game.
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefState {
    probabilities: BTreeMap<String, f64>,
    asked: BTreeSet<String>,
    question_count: u32,
    regime: Regime,
}

impl BeliefState {
    /// Uniform prior over every identity in the catalog.
    pub fn new(catalog: &Catalog) -> Self {
        let uniform = 1.0 / catalog.len() as f64;
        Self {
            probabilities: catalog
                .identities()
                .iter()
                .map(|identity| (identity.name().to_string(), uniform))
                .collect(),
            asked: BTreeSet::new(),
            question_count: 0,
            regime: Regime::Soft,
        }
    }

    pub(crate) fn from_parts(
        probabilities: BTreeMap<String, f64>,
        asked: BTreeSet<String>,
        question_count: u32,
        soft_threshold: u32,
    ) -> Self {
        Self {
            probabilities,
            asked,
            question_count,
            regime: Regime::for_count(question_count, soft_threshold),
        }
    }

    /// Probability for `name`; unknown names read as zero.
    pub fn probability(&self, name: &str) -> f64 {
        self.probabilities.get(name).copied().unwrap_or(0.0)
    }

    pub fn probabilities(&self) -> &BTreeMap<String, f64> {
        &self.probabilities
    }

    pub fn asked(&self) -> &BTreeSet<String> {
        &self.asked
    }

    pub fn has_asked(&self, attribute: &str) -> bool {
        self.asked.contains(attribute)
    }

    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn total_mass(&self) -> f64 {
        self.probabilities.values().sum()
    }

    /// Identities whose probability is above [`EPSILON`].
    pub fn active(&self) -> impl Iterator<Item = (&str, f64)> {
        self.probabilities
            .iter()
            .filter(|(_, p)| **p > EPSILON)
            .map(|(name, p)| (name.as_str(), *p))
    }

    pub fn remaining(&self) -> usize {
        self.active().count()
    }

    /// True once every identity has been ruled out by contradicting answers.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Active identities by descending probability; ties are broken by name.
    pub fn top_candidates(&self, k: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.active().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(k);
        ranked
    }

    /// Most probable active identity.
    pub fn leader(&self) -> Option<(&str, f64)> {
        self.top_candidates(1).into_iter().next()
    }

    /// Multiplies the known identity's probability by a steep penalty and renormalizes.
    ///
    /// Returns `false` without touching the state when `name` is not a known identity.
    pub fn penalize_wrong_guess(&mut self, name: &str, penalty: f64) -> bool {
        let Some(probability) = self.probabilities.get_mut(name) else {
            return false;
        };
        *probability *= penalty;
        self.normalize();
        true
    }

    pub(crate) fn record_question(&mut self, attribute: &str, soft_threshold: u32) -> Regime {
        self.question_count += 1;
        self.asked.insert(attribute.to_string());
        self.regime = self.regime.advance(self.question_count, soft_threshold);
        self.regime
    }

    pub(crate) fn scale(&mut self, name: &str, factor: f64) {
        if let Some(probability) = self.probabilities.get_mut(name) {
            *probability *= factor;
        }
    }

    pub(crate) fn eliminate(&mut self, name: &str) {
        if let Some(probability) = self.probabilities.get_mut(name) {
            *probability = 0.0;
        }
    }

    /// Rescales the distribution to sum to one.
    ///
    /// Returns `false` and leaves the mass untouched when it has collapsed below [`EPSILON`].
    pub(crate) fn normalize(&mut self) -> bool {
        let total = self.total_mass();
        if total < EPSILON {
            return false;
        }
        for probability in self.probabilities.values_mut() {
            *probability /= total;
        }
        true
    }
}
