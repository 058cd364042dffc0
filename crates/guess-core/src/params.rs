//! Tunable game parameters.

use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Evaluator used by the focus and global phases of question selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStrategy {
    /// Expected information gain over every unasked attribute.
    #[default]
    EntropyFull,
    /// Expected information gain over a seeded random sample of unasked attributes.
    EntropySampled,
    /// Closest-to-even probability mass split, without entropy.
    SplitBalance,
}

impl QuestionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionStrategy::EntropyFull => "entropy_full",
            QuestionStrategy::EntropySampled => "entropy_sampled",
            QuestionStrategy::SplitBalance => "split_balance",
        }
    }
}

impl FromStr for QuestionStrategy {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "entropy_full" | "entropy" | "full" => Ok(QuestionStrategy::EntropyFull),
            "entropy_sampled" | "sampled" => Ok(QuestionStrategy::EntropySampled),
            "split_balance" | "simple_heuristic" | "split" => Ok(QuestionStrategy::SplitBalance),
            _ => Err(()),
        }
    }
}

/// Thresholds and multipliers shared by the selector, updater and guess policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameParams {
    /// Probability at which the leader is guessed once enough questions were asked.
    pub certainty_threshold: f64,
    /// Questions required before a confident guess is allowed.
    pub min_questions_before_guess: u32,
    /// Answers numbered up to and including this count use the soft update.
    pub soft_elimination_threshold: u32,
    pub match_multiplier: f64,
    pub mismatch_multiplier: f64,
    /// Frontrunners considered by the focus phase.
    pub top_k_focus: usize,
    /// Factor applied to an identity the player said was a wrong guess.
    pub wrong_guess_penalty: f64,
    pub strategy: QuestionStrategy,
    pub attribute_sample_ratio: f64,
    pub min_attributes_to_sample: usize,
    pub sample_seed: u64,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            certainty_threshold: 0.85,
            min_questions_before_guess: 5,
            soft_elimination_threshold: 3,
            match_multiplier: 1.0,
            mismatch_multiplier: 0.4,
            top_k_focus: 5,
            wrong_guess_penalty: 0.01,
            strategy: QuestionStrategy::EntropyFull,
            attribute_sample_ratio: 0.3,
            min_attributes_to_sample: 5,
            sample_seed: 0,
        }
    }
}

impl GameParams {
    /// Defaults overridden by any well-formed `GUESS_*` environment variables.
    pub fn from_env() -> Self {
        let base = Self::default();
        let strategy = env::var("GUESS_STRATEGY")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(base.strategy);

        Self {
            certainty_threshold: parse_env_f64("GUESS_CERTAINTY", base.certainty_threshold)
                .clamp(0.01, 1.0),
            min_questions_before_guess: parse_env(
                "GUESS_MIN_QUESTIONS",
                base.min_questions_before_guess,
            ),
            soft_elimination_threshold: parse_env(
                "GUESS_SOFT_QUESTIONS",
                base.soft_elimination_threshold,
            ),
            match_multiplier: parse_env_f64("GUESS_MATCH_MULT", base.match_multiplier)
                .clamp(0.01, 1.0),
            mismatch_multiplier: parse_env_f64("GUESS_MISMATCH_MULT", base.mismatch_multiplier)
                .clamp(0.0, 1.0),
            top_k_focus: parse_env("GUESS_TOP_K", base.top_k_focus).max(2),
            wrong_guess_penalty: parse_env_f64("GUESS_WRONG_PENALTY", base.wrong_guess_penalty)
                .clamp(0.0, 1.0),
            strategy,
            attribute_sample_ratio: parse_env_f64(
                "GUESS_SAMPLE_RATIO",
                base.attribute_sample_ratio,
            )
            .clamp(0.01, 1.0),
            min_attributes_to_sample: parse_env("GUESS_SAMPLE_MIN", base.min_attributes_to_sample),
            sample_seed: parse_env("GUESS_SAMPLE_SEED", base.sample_seed),
        }
    }

    /// Rejects values that would break normalization or the guess policy.
    pub fn validate(&self) -> Result<(), GameError> {
        check_unit("certainty_threshold", self.certainty_threshold, false)?;
        check_unit("match_multiplier", self.match_multiplier, false)?;
        check_unit("mismatch_multiplier", self.mismatch_multiplier, true)?;
        check_unit("wrong_guess_penalty", self.wrong_guess_penalty, true)?;
        check_unit("attribute_sample_ratio", self.attribute_sample_ratio, false)?;
        if self.top_k_focus < 2 {
            return Err(GameError::InvalidParams {
                field: "top_k_focus",
                message: "focus needs at least two candidates".to_string(),
            });
        }
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f64, allow_zero: bool) -> Result<(), GameError> {
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if value.is_finite() && lower_ok && value <= 1.0 {
        return Ok(());
    }
    Err(GameError::InvalidParams {
        field,
        message: format!("{value} is outside the unit interval"),
    })
}

fn parse_env_f64(key: &str, fallback: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(fallback)
}

fn parse_env<T: FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}
