//! Observability - sweep events appended as JSON lines.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SWEEP_START: &str = "sweep_start";
pub const EPISODE_DONE: &str = "episode_done";
pub const EPISODE_FAILED: &str = "episode_failed";
pub const SWEEP_STOP: &str = "sweep_stop";

/// An engine event for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub sweep_id: Option<Uuid>,
    pub episode_id: Option<u64>,
    pub message: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl EngineEvent {
    pub fn new(event_type: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            sweep_id: None,
            episode_id: None,
            message: message.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn sweep(mut self, sweep_id: Uuid) -> Self {
        self.sweep_id = Some(sweep_id);
        self
    }

    pub fn episode(mut self, episode_id: u64) -> Self {
        self.episode_id = Some(episode_id);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Event emitter for engine observability.
pub struct EventEmitter {
    events_path: PathBuf,
}

impl EventEmitter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            events_path: output_dir.join("events.jsonl"),
        }
    }

    /// Emit an event.
    pub fn emit(&self, event: EngineEvent) -> Result<()> {
        if let Some(parent) = self.events_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)?;

        let line = serde_json::to_string(&event)?;
        writeln!(file, "{}", line)?;

        Ok(())
    }

    /// Emit a simple event.
    pub fn emit_simple(&self, event_type: &str, message: &str) -> Result<()> {
        self.emit(EngineEvent::new(event_type, message))
    }

    /// Read recent events.
    pub fn read_recent(&self, limit: usize) -> Vec<EngineEvent> {
        let file = match std::fs::File::open(&self.events_path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let reader = BufReader::new(file);
        let mut events: Vec<EngineEvent> = reader
            .lines()
            .filter_map(|line| line.ok())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        if events.len() > limit {
            events.drain(0..events.len() - limit);
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_the_most_recent_events() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = EventEmitter::new(&dir.path().join("runs"));
        let sweep = Uuid::new_v4();
        emitter
            .emit(EngineEvent::new(SWEEP_START, "3 episodes").sweep(sweep))
            .unwrap();
        for id in 0..3 {
            emitter
                .emit(EngineEvent::new(EPISODE_DONE, "ok").sweep(sweep).episode(id))
                .unwrap();
        }
        emitter.emit_simple(SWEEP_STOP, "done").unwrap();

        let recent = emitter.read_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].episode_id, Some(2));
        assert_eq!(recent[1].event_type, SWEEP_STOP);
        assert!(EventEmitter::new(&dir.path().join("missing"))
            .read_recent(5)
            .is_empty());
    }
}
