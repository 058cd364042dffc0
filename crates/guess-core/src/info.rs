//! Entropy and attribute-ranking functions over the current belief.

use crate::EPSILON;
use crate::belief::BeliefState;
use crate::catalog::{Catalog, Identity};

/// Shannon entropy in bits.
///
/// Values at or below [`EPSILON`] are dropped and the rest are renormalized when their
/// sum is not already one, so partial sums taken from a subset are accepted as-is.
pub fn entropy<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let probs: Vec<f64> = values.into_iter().filter(|p| *p > EPSILON).collect();
    if probs.is_empty() {
        return 0.0;
    }
    let total: f64 = probs.iter().sum();
    let scale = if (total - 1.0).abs() > EPSILON { total } else { 1.0 };
    -probs
        .iter()
        .map(|p| p / scale)
        .filter(|p| *p > EPSILON)
        .map(|p| p * p.log2())
        .sum::<f64>()
}

/// Ranks candidate attributes against a subset of identities using their current
/// (not subset-renormalized) probabilities.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    catalog: &'a Catalog,
    belief: &'a BeliefState,
}

impl<'a> Evaluator<'a> {
    pub fn new(catalog: &'a Catalog, belief: &'a BeliefState) -> Self {
        Self { catalog, belief }
    }

    /// Live members of `candidates` paired with their probability.
    fn weighted(&self, candidates: &[&str]) -> Vec<(&'a Identity, f64)> {
        candidates
            .iter()
            .filter_map(|name| self.catalog.identity(name))
            .map(|identity| (identity, self.belief.probability(identity.name())))
            .filter(|(_, p)| *p > EPSILON)
            .collect()
    }

    /// Expected reduction in entropy of `candidates` from asking `attribute`.
    pub fn information_gain(&self, candidates: &[&str], attribute: &str) -> f64 {
        let weighted = self.weighted(candidates);
        let total: f64 = weighted.iter().map(|(_, p)| p).sum();
        if total < EPSILON {
            return 0.0;
        }
        let current = entropy(weighted.iter().map(|(_, p)| p / total));
        current - expected_entropy(&weighted, total, attribute)
    }

    /// Attribute with the strictly largest information gain above [`EPSILON`].
    ///
    /// Returns `None` for an empty subset, or for a single candidate once
    /// `min_questions` have been asked.
    pub fn best_by_information_gain<'s>(
        &self,
        candidates: &[&str],
        attributes: &[&'s str],
        min_questions: u32,
    ) -> Option<&'s str> {
        if candidates.is_empty() {
            return None;
        }
        if candidates.len() == 1 && self.belief.question_count() >= min_questions {
            return None;
        }

        let weighted = self.weighted(candidates);
        let total: f64 = weighted.iter().map(|(_, p)| p).sum();
        if weighted.is_empty() || total < EPSILON {
            return None;
        }
        let current = entropy(weighted.iter().map(|(_, p)| p / total));

        let mut best = None;
        let mut max_gain = f64::NEG_INFINITY;
        for &attribute in attributes {
            let gain = current - expected_entropy(&weighted, total, attribute);
            if gain > max_gain {
                max_gain = gain;
                best = Some(attribute);
            }
        }

        best.filter(|_| max_gain > EPSILON)
    }

    /// Attribute whose yes/no probability mass split is closest to even.
    ///
    /// Only returned when both sides carry mass, which implies the attribute varies
    /// among `candidates`.
    pub fn best_by_split_balance<'s>(
        &self,
        candidates: &[&str],
        attributes: &[&'s str],
    ) -> Option<&'s str> {
        if candidates.len() < 2 {
            return None;
        }
        let members: Vec<&Identity> = candidates
            .iter()
            .filter_map(|name| self.catalog.identity(name))
            .collect();

        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for &attribute in attributes {
            let (yes, no) = members.iter().fold((0.0, 0.0), |(yes, no), identity| {
                let p = self.belief.probability(identity.name());
                if identity.has(attribute) {
                    (yes + p, no)
                } else {
                    (yes, no + p)
                }
            });
            let score = f64::min(yes, no);
            if score > best_score {
                best_score = score;
                best = Some(attribute);
            }
        }

        let attribute = best.filter(|_| best_score > EPSILON)?;
        varies(&members, attribute).then_some(attribute)
    }
}

fn expected_entropy(weighted: &[(&Identity, f64)], total: f64, attribute: &str) -> f64 {
    let (yes, no): (Vec<_>, Vec<_>) = weighted
        .iter()
        .partition(|(identity, _)| identity.has(attribute));
    let mass_yes: f64 = yes.iter().map(|(_, p)| p).sum();
    let mass_no: f64 = no.iter().map(|(_, p)| p).sum();

    let entropy_yes = entropy(yes.iter().map(|(_, p)| *p));
    let entropy_no = entropy(no.iter().map(|(_, p)| *p));
    (mass_yes / total) * entropy_yes + (mass_no / total) * entropy_no
}

/// True when `members` do not all share the same value for `attribute`.
pub(crate) fn varies(members: &[&Identity], attribute: &str) -> bool {
    let mut values = members.iter().map(|identity| identity.has(attribute));
    match values.next() {
        Some(first) => values.any(|value| value != first),
        None => false,
    }
}
