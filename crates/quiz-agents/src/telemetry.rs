//! Per-run telemetry, appended as one JSON line per run to
//! `<data>/telemetry.jsonl`.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use debate_core::{QuizArtifact, QuizMethod};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Summary of one quiz generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub topic: String,
    pub method: QuizMethod,
    /// Rounds actually debated; 0 for the baseline.
    pub rounds: u32,
    pub degraded_turns: usize,
    pub fallback: bool,
    pub duration_ms: u64,
    pub generation_model: String,
    pub embedding_model: String,
    pub prompt_version: String,
    pub timestamp: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(
        run_id: impl Into<String>,
        quiz: &QuizArtifact,
        rounds: u32,
        degraded_turns: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            topic: quiz.topic.clone(),
            method: quiz.method,
            rounds,
            degraded_turns,
            fallback: quiz.is_fallback(),
            duration_ms: elapsed.as_millis() as u64,
            generation_model: String::new(),
            embedding_model: String::new(),
            prompt_version: quiz.prompt_version.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_models(mut self, generation: &str, embedding: &str) -> Self {
        self.generation_model = generation.to_string();
        self.embedding_model = embedding.to_string();
        self
    }
}

/// Append `record` to the JSONL file at `path`. Failures only warn.
pub fn append_run(record: &RunRecord, path: &Path) {
    let json = match serde_json::to_string(record) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize telemetry: {e}");
            return;
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create telemetry directory: {e}");
            return;
        }
    }

    use std::io::Write;
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(mut file) => {
            if let Err(e) = writeln!(file, "{json}") {
                warn!("Failed to append telemetry: {e}");
            } else {
                info!(path = %path.display(), run_id = %record.run_id, "Appended run telemetry");
            }
        }
        Err(e) => warn!("Failed to open telemetry file: {e}"),
    }
}
