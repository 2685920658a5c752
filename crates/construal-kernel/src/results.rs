//! Result sink - one append-only record per finished episode.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use construal_core::NamedRow;
use construal_planner::AbstractionMode;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::actuator::Outcome;

/// Summary of one completed episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    #[serde(default)]
    pub sweep_id: Option<Uuid>,
    pub episode_id: u64,
    pub target_item: String,
    pub abstraction_mode: AbstractionMode,
    pub location_set: String,
    pub plans_per_replan: usize,
    pub seed: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Seconds spent planning
    pub plan_time: f64,
    /// Seconds spent in the actuator
    pub run_time: f64,
    pub total_time: f64,
    pub actuator_time: f64,
    pub actuator_distance: f64,
    pub observation_count: usize,
    pub replan_count: u32,
    pub no_plan_count: u32,
    pub run_count: u32,
    /// 1 success, 0 in progress, -1 failure
    pub outcome: i8,
    pub outcome_name: Outcome,
    /// Rows of the last executed plan that needed a visit
    pub final_plan: Vec<NamedRow>,
}

impl EpisodeRecord {
    pub fn is_success(&self) -> bool {
        self.outcome_name == Outcome::Success
    }
}

/// Append-only destination for episode records.
pub trait ResultSink: Send {
    fn append(&mut self, record: &EpisodeRecord) -> Result<()>;
}

/// JSON lines at `<output_dir>/results.jsonl`.
pub struct JsonlResultSink {
    path: PathBuf,
}

impl JsonlResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record written so far.
    ///
    /// A missing file holds no records. Lines that do not parse are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<EpisodeRecord>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", self.path.display()))
            }
        };

        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {}", self.path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = number + 1,
                    error = %e,
                    "skipping unreadable result record"
                ),
            }
        }
        Ok(records)
    }
}

impl ResultSink for JsonlResultSink {
    fn append(&mut self, record: &EpisodeRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;

        Ok(())
    }
}

/// In-memory sink. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryResultSink {
    records: Arc<Mutex<Vec<EpisodeRecord>>>,
}

impl MemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EpisodeRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for MemoryResultSink {
    fn append(&mut self, record: &EpisodeRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("result buffer poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
