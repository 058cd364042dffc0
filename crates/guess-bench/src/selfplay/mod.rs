mod oracle;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use guess_core::{
    Catalog, Finish, Game, GameError, Identity, QuestionStrategy, Turn, UpdateOutcome,
};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use crate::config::{AgentConfig, BenchmarkConfig, ResolvedOutputs};
use crate::dataset::{DatasetError, load_catalog};

pub use oracle::NoisyOracle;

/// Plays every agent against every identity for the configured number of rounds.
pub struct SelfPlayRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    catalog: Catalog,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub analytics: AnalyticsSummary,
}

impl SelfPlayRunner {
    /// Build a runner from a validated configuration, loading the catalog from disk.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let catalog = load_catalog(&config.catalog.path)?;
        Ok(Self::with_catalog(config, outputs, catalog))
    }

    pub fn with_catalog(
        config: BenchmarkConfig,
        outputs: ResolvedOutputs,
        catalog: Catalog,
    ) -> Self {
        Self {
            config,
            outputs,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Execute all games, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(&self.config)?;
        let mut rows_written = 0usize;

        event!(
            target: "guess_bench::run",
            Level::INFO,
            run_id = self.config.run_id.as_str(),
            identities = self.catalog.len() as u64,
            attributes = self.catalog.attributes().len() as u64,
            agents = self.config.agents.len() as u64,
            rounds = self.config.games.rounds as u64,
            "self-play started"
        );

        for round in 0..self.config.games.rounds {
            for secret in self.catalog.identities() {
                // Every agent hears the same noisy answers for a given round and secret.
                let game_seed = rng.next_u64();
                let mut outcomes = Vec::with_capacity(self.config.agents.len());
                for agent in &self.config.agents {
                    let outcome = self.play_game(agent, secret, game_seed)?;
                    write_game_row(
                        &mut writer,
                        &self.config.run_id,
                        round,
                        game_seed,
                        &outcome,
                    )?;
                    rows_written += 1;
                    outcomes.push(outcome);
                }
                analytics.record_matchup(round, secret.name(), &outcomes)?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        event!(
            target: "guess_bench::run",
            Level::INFO,
            run_id = self.config.run_id.as_str(),
            games = rows_written as u64,
            "self-play finished"
        );

        Ok(RunSummary {
            games_played: rows_written,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            analytics: summary,
        })
    }

    /// Plays one game of `agent` against the simulated player holding `secret`.
    pub fn play_game(
        &self,
        agent: &AgentConfig,
        secret: &Identity,
        game_seed: u64,
    ) -> Result<GameOutcome, RunnerError> {
        let games = &self.config.games;
        let mut game = Game::new(&self.catalog, &agent.params)?;
        let mut oracle = NoisyOracle::new(secret, games.answer_noise, game_seed);
        let mut wrong_guesses = 0u32;
        let mut last_guess: Option<(String, f64)> = None;

        let result = loop {
            if game.state().question_count() + wrong_guesses >= games.max_turns {
                break GameResult::TurnLimit;
            }

            match game.next_turn() {
                Turn::Ask(attribute) => {
                    let answer = oracle.answer(attribute);
                    if game.answer(attribute, answer)? == UpdateOutcome::Contradiction {
                        break GameResult::NoMatch;
                    }
                }
                Turn::Guess {
                    name, confidence, ..
                } => {
                    let correct = name == oracle.secret().name();
                    if !correct && wrong_guesses < games.max_wrong_guesses {
                        game.reject_guess(&name)?;
                    }
                    last_guess = Some((name, confidence));
                    if correct {
                        break GameResult::Solved;
                    }
                    wrong_guesses += 1;
                    if wrong_guesses > games.max_wrong_guesses {
                        break GameResult::GaveUp;
                    }
                }
                Turn::Finished(Finish::NoMatch) => break GameResult::NoMatch,
                Turn::Finished(Finish::Stumped) => break GameResult::Stumped,
            }
        };

        let metrics = game.metrics();
        let (guess, confidence) = match last_guess {
            Some((name, confidence)) => (Some(name), confidence),
            None => (None, metrics.leader_probability),
        };

        let outcome = GameOutcome {
            agent: agent.name.clone(),
            strategy: agent.params.strategy,
            secret: secret.name().to_string(),
            result,
            guess,
            questions: metrics.question_count,
            wrong_guesses,
            confidence,
            flipped_answers: oracle.flipped(),
        };

        // Filtered out by the telemetry subscriber unless `logging.game_details` is set.
        event!(
            target: "guess_bench::game",
            Level::INFO,
            agent = outcome.agent.as_str(),
            secret = outcome.secret.as_str(),
            outcome = outcome.result.as_str(),
            questions = outcome.questions,
            wrong_guesses = outcome.wrong_guesses,
            flipped = outcome.flipped_answers,
            remaining = metrics.remaining as u64,
            entropy_bits = metrics.entropy_bits,
        );

        Ok(outcome)
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    round: usize,
    game_seed: u64,
    outcome: &GameOutcome,
) -> Result<(), RunnerError> {
    let row = GameLogRow {
        run_id,
        game_id: game_id(round, &outcome.secret),
        round,
        game_seed,
        agent: &outcome.agent,
        strategy: outcome.strategy.as_str(),
        secret: &outcome.secret,
        guess: outcome.guess.as_deref(),
        outcome: outcome.result.as_str(),
        questions: outcome.questions,
        wrong_guesses: outcome.wrong_guesses,
        confidence: outcome.confidence,
        flipped_answers: outcome.flipped_answers,
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

pub(crate) fn game_id(round: usize, secret: &str) -> String {
    format!("R{round:04}_{secret}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Solved,
    /// The simulated player contradicted every identity.
    NoMatch,
    Stumped,
    /// Too many wrong guesses.
    GaveUp,
    TurnLimit,
}

impl GameResult {
    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::Solved => "solved",
            GameResult::NoMatch => "no_match",
            GameResult::Stumped => "stumped",
            GameResult::GaveUp => "gave_up",
            GameResult::TurnLimit => "turn_limit",
        }
    }

    pub fn is_solved(self) -> bool {
        self == GameResult::Solved
    }
}

/// Result of a single self-play game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    pub agent: String,
    pub strategy: QuestionStrategy,
    pub secret: String,
    pub result: GameResult,
    pub guess: Option<String>,
    pub questions: u32,
    pub wrong_guesses: u32,
    /// Confidence of the last guess, or the leader's share when none was made.
    pub confidence: f64,
    pub flipped_answers: u32,
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_id: String,
    round: usize,
    game_seed: u64,
    agent: &'a str,
    strategy: &'static str,
    secret: &'a str,
    guess: Option<&'a str>,
    outcome: &'static str,
    questions: u32,
    wrong_guesses: u32,
    confidence: f64,
    flipped_answers: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to load catalog: {0}")]
    Dataset(#[from] DatasetError),
    #[error("game execution failed: {0}")]
    Game(#[from] GameError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
