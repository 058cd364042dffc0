use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::BenchmarkConfig;
use crate::selfplay::{GameOutcome, game_id};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in self-play results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{0}' missing for game {1}")]
    MissingBaselineGame(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    agent_order: Vec<String>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.name.clone(), agent.params.strategy.as_str()),
            );
            order.push(agent.name.clone());
        }

        if !agents.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            agents,
            comparisons: HashMap::new(),
            agent_order: order,
        })
    }

    /// Records every agent's game against the same secret in the same round.
    pub fn record_matchup(
        &mut self,
        round: usize,
        secret: &str,
        outcomes: &[GameOutcome],
    ) -> Result<(), AnalyticsError> {
        let baseline_questions = outcomes
            .iter()
            .find(|outcome| outcome.agent == self.baseline)
            .map(|outcome| outcome.questions as f64)
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineGame(self.baseline.clone(), game_id(round, secret))
            })?;

        for outcome in outcomes {
            let acc = self
                .agents
                .get_mut(&outcome.agent)
                .ok_or_else(|| AnalyticsError::UnknownAgent(outcome.agent.clone()))?;
            acc.record_game(outcome);

            if outcome.agent != self.baseline {
                self.comparisons
                    .entry(outcome.agent.clone())
                    .or_insert_with(ComparisonAccumulator::new)
                    .record(outcome.questions as f64 - baseline_questions);
            }
        }

        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let comparisons = reports
            .iter()
            .map(|report| {
                let (p_value, sample_size) = if report.name == self.baseline {
                    (1.0, report.games)
                } else {
                    self.comparisons
                        .remove(&report.name)
                        .map(ComparisonAccumulator::wilcoxon_signed_rank)
                        .unwrap_or((1.0, 0))
                };
                ComparisonReport {
                    agent: report.name.clone(),
                    p_value,
                    sample_size,
                }
            })
            .collect();

        AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            comparisons,
        }
        .enrich()
    }
}

struct AgentAccumulator {
    name: String,
    strategy: &'static str,
    games: usize,
    solved: usize,
    per_game_questions: Vec<f64>,
    wrong_guesses: u64,
    flipped_answers: u64,
    outcomes: BTreeMap<&'static str, usize>,
}

impl AgentAccumulator {
    fn new(name: String, strategy: &'static str) -> Self {
        Self {
            name,
            strategy,
            games: 0,
            solved: 0,
            per_game_questions: Vec::new(),
            wrong_guesses: 0,
            flipped_answers: 0,
            outcomes: BTreeMap::new(),
        }
    }

    fn record_game(&mut self, outcome: &GameOutcome) {
        self.games += 1;
        if outcome.result.is_solved() {
            self.solved += 1;
        }
        self.per_game_questions.push(outcome.questions as f64);
        self.wrong_guesses += u64::from(outcome.wrong_guesses);
        self.flipped_answers += u64::from(outcome.flipped_answers);
        *self.outcomes.entry(outcome.result.as_str()).or_insert(0) += 1;
    }

    fn into_report(self) -> AgentReport {
        let per_game = |total: f64| {
            if self.games == 0 {
                0.0
            } else {
                total / self.games as f64
            }
        };

        AgentReport {
            name: self.name.clone(),
            strategy: self.strategy,
            games: self.games,
            solved: self.solved,
            solve_rate: per_game(self.solved as f64),
            avg_questions: per_game(self.per_game_questions.iter().sum()),
            ci95: confidence_interval(&self.per_game_questions),
            avg_wrong_guesses: per_game(self.wrong_guesses as f64),
            avg_flipped_answers: per_game(self.flipped_answers as f64),
            outcomes: self
                .outcomes
                .iter()
                .map(|(label, count)| (label.to_string(), *count))
                .collect(),
            delta_vs_baseline: 0.0, // Filled later once we know baseline report
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    /// Two-sided normal approximation with tie and continuity correction.
    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut ranks = Vec::with_capacity(n);
        let mut tie_sizes = Vec::new();
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            ranks.extend(paired[i..=j].iter().map(|(_, sign)| (rank, *sign)));
            if j > i {
                tie_sizes.push(j - i + 1);
            }
            i = j + 1;
        }

        let w_plus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign > 0.0)
            .map(|(rank, _)| *rank)
            .sum();
        let w_minus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign < 0.0)
            .map(|(rank, _)| *rank)
            .sum();

        let w = w_plus.min(w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;

        let tie_adjustment: f64 = tie_sizes
            .into_iter()
            .map(|count| {
                let c = count as f64;
                (c.powi(3) - c) / 48.0
            })
            .sum();
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let Ok(normal) = Normal::new(0.0, 1.0) else {
            return (1.0, n);
        };
        let z = (((w - mean_w).abs() - 0.5) / variance_w.sqrt()).max(0.0);
        let p = 2.0 * (1.0 - normal.cdf(z));
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_avg = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.avg_questions)
            .unwrap_or(0.0);

        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.avg_questions - baseline_avg;
        }

        self
    }

    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn p_value(&self, name: &str) -> f64 {
        self.comparisons
            .iter()
            .find(|c| c.agent == name)
            .map(|c| c.p_value)
            .unwrap_or(1.0)
    }

    pub fn render_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str("# Self-Play Summary\n\n");
        rows.push_str(&format!("Baseline: `{}`\n\n", self.baseline));
        rows.push_str("| Agent | Strategy | Games | Solve % | Avg questions | Δ vs baseline | 95% CI | Avg wrong guesses | Avg flipped answers | p-value |\n");
        rows.push_str("|-------|----------|-------|---------|---------------|----------------|--------|-------------------|---------------------|---------|\n");

        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {strategy} | {games} | {solve:.1}% | {avg:.3} | {delta:+.3} | [{ci_low:.3}, {ci_high:.3}] | {wrong:.3} | {flipped:.3} | {pval:.3} |\n",
                name = agent.name,
                strategy = agent.strategy,
                games = agent.games,
                solve = agent.solve_rate * 100.0,
                avg = agent.avg_questions,
                delta = agent.delta_vs_baseline,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                wrong = agent.avg_wrong_guesses,
                flipped = agent.avg_flipped_answers,
                pval = self.p_value(&agent.name),
            ));
        }

        rows.push_str("\n## Outcomes\n\n");
        for agent in &self.agents {
            let counts: Vec<String> = agent
                .outcomes
                .iter()
                .map(|(label, count)| format!("{label}: {count}"))
                .collect();
            rows.push_str(&format!("- {}: {}\n", agent.name, counts.join(", ")));
        }
        rows
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub strategy: &'static str,
    pub games: usize,
    pub solved: usize,
    pub solve_rate: f64,
    pub avg_questions: f64,
    pub ci95: (f64, f64),
    pub avg_wrong_guesses: f64,
    pub avg_flipped_answers: f64,
    pub outcomes: BTreeMap<String, usize>,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
