//! Soft elimination: early answers down-weight mismatching identities instead of removing them.

use super::{Answer, BeliefState};
use crate::EPSILON;
use crate::catalog::Catalog;
use crate::params::GameParams;

/// Multipliers applied during the soft regime.
#[derive(Debug, Clone, Copy)]
pub struct SoftConfig {
    /// Applied to identities whose attribute value agrees with the answer.
    pub match_multiplier: f64,
    /// Applied to identities that disagree. Kept above zero so no candidate is lost outright.
    pub mismatch_multiplier: f64,
}

impl Default for SoftConfig {
    fn default() -> Self {
        Self::from_params(&GameParams::default())
    }
}

impl SoftConfig {
    pub fn from_params(params: &GameParams) -> Self {
        Self {
            match_multiplier: params.match_multiplier,
            mismatch_multiplier: params.mismatch_multiplier,
        }
    }
}

/// Encapsulates the soft likelihood update.
#[derive(Debug, Clone)]
pub struct SoftLikelihoodModel {
    config: SoftConfig,
}

impl SoftLikelihoodModel {
    pub fn new(config: SoftConfig) -> Self {
        Self { config }
    }

    /// Scales every live identity by the match or mismatch multiplier. Does not renormalize.
    pub fn apply(
        &self,
        belief: &mut BeliefState,
        catalog: &Catalog,
        attribute: &str,
        answer: Answer,
    ) {
        for identity in catalog.identities() {
            if belief.probability(identity.name()) < EPSILON {
                continue;
            }
            let weight = if answer.matches(identity.has(attribute)) {
                self.config.match_multiplier
            } else {
                self.config.mismatch_multiplier
            };
            belief.scale(identity.name(), weight);
        }
    }
}
