use std::path::PathBuf;

use clap::Parser;
use guess_core::GameParams;

use guess_bench::config::{AgentConfig, BenchmarkConfig, ResolvedOutputs};
use guess_bench::logging::init_logging;
use guess_bench::selfplay::SelfPlayRunner;
use guess_bench::telemetry::{append_highlights_to_markdown, write_summary_outputs};

/// Self-play harness for the guessing engine.
#[derive(Debug, Parser)]
#[command(
    name = "guess-bench",
    author,
    version,
    about = "Deterministic self-play harness for the guessing engine"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of rounds over the catalog.
    #[arg(long, value_name = "ROUNDS")]
    rounds: Option<usize>,

    /// Override the RNG seed for simulated answers.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the probability that the simulated player flips an answer.
    #[arg(long, value_name = "P")]
    noise: Option<f64>,

    /// Override the catalog file.
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Exit after validating the configuration and loading the catalog.
    #[arg(long)]
    validate_only: bool,

    /// Emit one telemetry event per game regardless of config.
    #[arg(long)]
    log_game_details: bool,

    /// Add an agent with this name whose parameters come from GUESS_* variables.
    #[arg(long, value_name = "NAME")]
    env_agent: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(rounds) = cli.rounds {
        config.games.rounds = rounds;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(noise) = cli.noise {
        config.games.answer_noise = noise;
    }

    if let Some(catalog) = cli.catalog {
        config.catalog.path = catalog;
    }

    if cli.log_game_details {
        config.logging.game_details = true;
    }

    if let Some(name) = cli.env_agent {
        config.agents.push(AgentConfig {
            name,
            params: GameParams::from_env(),
        });
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let rounds = config.games.rounds;
    let noise = config.games.answer_noise;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({rounds} rounds, answer noise {noise})",
        if agent_count == 1 { "" } else { "s" }
    );

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = SelfPlayRunner::new(config, outputs.clone())?;
    println!(
        "Catalog: {} identities, {} attributes",
        runner.catalog().len(),
        runner.catalog().attributes().len()
    );

    if cli.validate_only {
        println!("Validation-only mode: self-play skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Self-play complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    for agent in &summary.analytics.agents {
        println!(
            "  {}: solved {:.1}%, {:.2} questions per game",
            agent.name,
            agent.solve_rate * 100.0,
            agent.avg_questions
        );
    }
    println!("Summary table: {}", summary.summary_path.display());

    // Dropping the guard flushes the background writer before the log is summarised.
    if let Some(guard) = logging_guard {
        let telemetry_path = guard.telemetry_path.clone();
        drop(guard);
        println!("Telemetry log: {}", telemetry_path.display());
        if let Some(telemetry) = write_summary_outputs(&telemetry_path, &outputs.report_dir())? {
            append_highlights_to_markdown(&summary.summary_path, &telemetry)?;
            println!("Telemetry summary (JSON): {}", telemetry.json_path.display());
            println!(
                "  Selector decisions: {} events, {} contradictions",
                telemetry.summary.selection.count, telemetry.summary.updates.contradictions
            );
        }
    }

    Ok(())
}
