use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub selection: SelectionTelemetrySummary,
    pub updates: UpdateTelemetrySummary,
    pub games: GameTelemetrySummary,
}

/// Question selector decisions (`guess_core::select`, debug level).
#[derive(Debug, Default, Serialize)]
pub struct SelectionTelemetrySummary {
    pub count: usize,
    pub avg_active: Option<f64>,
    pub avg_pool: Option<f64>,
    pub phase_counts: BTreeMap<String, usize>,
}

/// Belief updates (`guess_core::update`).
#[derive(Debug, Default, Serialize)]
pub struct UpdateTelemetrySummary {
    pub count: usize,
    pub contradictions: usize,
    pub regime_counts: BTreeMap<String, usize>,
}

/// Per-game events (`guess_bench::game`, enabled by `logging.game_details`).
#[derive(Debug, Default, Serialize)]
pub struct GameTelemetrySummary {
    pub count: usize,
    pub avg_final_entropy: Option<f64>,
    pub outcome_counts: BTreeMap<String, usize>,
}

#[derive(Debug)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

fn label(fields: &serde_json::Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>")
        .to_string()
}

/// Aggregates the JSON telemetry log written by [`crate::logging::init_logging`].
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut summary = TelemetrySummary::default();
    let mut active_avg = Average::new();
    let mut pool_avg = Average::new();
    let mut entropy_avg = Average::new();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match target {
            "guess_core::select" => {
                let selection = &mut summary.selection;
                selection.count += 1;
                if let Some(active) = fields.get("active").and_then(Value::as_f64) {
                    active_avg.add(active);
                }
                if let Some(pool) = fields.get("pool").and_then(Value::as_f64) {
                    pool_avg.add(pool);
                }
                *selection
                    .phase_counts
                    .entry(label(&fields, "phase"))
                    .or_insert(0) += 1;
            }
            "guess_core::update" => {
                let updates = &mut summary.updates;
                updates.count += 1;
                if fields.get("message").and_then(Value::as_str) == Some("contradiction") {
                    updates.contradictions += 1;
                } else {
                    *updates
                        .regime_counts
                        .entry(label(&fields, "regime"))
                        .or_insert(0) += 1;
                }
            }
            "guess_bench::game" => {
                let games = &mut summary.games;
                games.count += 1;
                if let Some(entropy) = fields.get("entropy_bits").and_then(Value::as_f64) {
                    entropy_avg.add(entropy);
                }
                *games
                    .outcome_counts
                    .entry(label(&fields, "outcome"))
                    .or_insert(0) += 1;
            }
            _ => {}
        }
    }

    summary.selection.avg_active = active_avg.mean();
    summary.selection.avg_pool = pool_avg.mean();
    summary.games.avg_final_entropy = entropy_avg.mean();
    Ok(summary)
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");

    std::fs::write(&json_path, serde_json::to_vec_pretty(&summary)?).map_err(|source| {
        TelemetryError::Io {
            context: "writing telemetry summary json",
            source,
        }
    })?;

    Ok(Some(TelemetryOutputs { summary, json_path }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let summary = &outputs.summary;
    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    section.push_str(&format!(
        "- Selector decisions captured: {}\n",
        summary.selection.count
    ));
    if let Some(value) = summary.selection.avg_active {
        section.push_str(&format!("- Avg live candidates: {value:.2}\n"));
    }
    if let Some(value) = summary.selection.avg_pool {
        section.push_str(&format!("- Avg attributes evaluated: {value:.2}\n"));
    }
    push_counts(&mut section, "Selection phases", &summary.selection.phase_counts);
    section.push_str(&format!(
        "- Belief updates: {} ({} contradictions)\n",
        summary.updates.count, summary.updates.contradictions
    ));
    push_counts(&mut section, "Update regimes", &summary.updates.regime_counts);
    if summary.games.count > 0 {
        section.push_str(&format!("- Game events: {}\n", summary.games.count));
        if let Some(value) = summary.games.avg_final_entropy {
            section.push_str(&format!("- Avg final entropy: {value:.3} bits\n"));
        }
    }

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn push_counts(section: &mut String, title: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    section.push_str(&format!("- {title}:\n"));
    for (label, count) in counts {
        section.push_str(&format!("  - {label}: {count}\n"));
    }
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
}
