use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, ResolvedOutputs};

pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Target of the per-game events emitted by the self-play runner.
pub const GAME_TARGET: &str = "guess_bench::game";

/// Keeps the background writer alive; dropping it flushes pending events.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Filter directives for the telemetry log: the configured level everywhere, with
/// per-game events switched on only when `game_details` is set.
pub fn filter_directives(logging: &LoggingConfig) -> String {
    let level = logging.level().unwrap_or(Level::INFO);
    let games = if logging.game_details { "info" } else { "off" };
    format!(
        "{},{GAME_TARGET}={games}",
        level.as_str().to_ascii_lowercase()
    )
}

/// `RUST_LOG` wins over the configured directives when set.
fn telemetry_filter(logging: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = filter_directives(logging);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("parsing telemetry filter '{directives}'"))
}

fn open_telemetry_file(dir: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    let path = dir.join(TELEMETRY_FILE);
    let file = File::create(&path)
        .with_context(|| format!("creating telemetry file at {}", path.display()))?;
    Ok((file, path))
}

/// Streams JSON events into `telemetry.jsonl` beside the run summary.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let filter = telemetry_filter(logging)?;
    let (file, telemetry_path) = open_telemetry_file(&outputs.report_dir())?;
    let (writer, guard) = NonBlockingBuilder::default().lossy(false).finish(file);

    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();

    // Later runs in the same process keep writing through the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(level: &str, game_details: bool) -> LoggingConfig {
        LoggingConfig {
            enable_structured: true,
            tracing_level: level.to_string(),
            game_details,
        }
    }

    #[test]
    fn game_events_follow_game_details() {
        assert_eq!(
            filter_directives(&logging("DEBUG", true)),
            "debug,guess_bench::game=info"
        );
        assert_eq!(
            filter_directives(&logging("warn", false)),
            "warn,guess_bench::game=off"
        );
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let directives = filter_directives(&logging("chatty", false));
        assert_eq!(directives, "info,guess_bench::game=off");
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn disabled_logging_creates_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outputs = ResolvedOutputs {
            jsonl: dir.path().join("out/games.jsonl"),
            summary_md: dir.path().join("out/summary.md"),
        };
        let guard = init_logging(&LoggingConfig::default(), &outputs).expect("init");
        assert!(guard.is_none());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn telemetry_file_lands_in_report_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_, path) = open_telemetry_file(&dir.path().join("nested")).expect("open");
        assert_eq!(path, dir.path().join("nested").join(TELEMETRY_FILE));
        assert!(path.exists());
    }
}
