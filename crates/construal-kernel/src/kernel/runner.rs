//! Runner - executes a sweep on a bounded worker pool.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use construal_core::CatalogError;
use serde_json::json;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};
use uuid::Uuid;

use super::Sweep;
use crate::actuator::ActuatorKind;
use crate::catalog::Catalog;
use crate::config::ExperimentConfig;
use crate::context::EngineContext;
use crate::episode::{run_episode, EpisodeParams};
use crate::error::EpisodeError;
use crate::observability::{
    EngineEvent, EventEmitter, EPISODE_DONE, EPISODE_FAILED, SWEEP_START, SWEEP_STOP,
};
use crate::results::{EpisodeRecord, ResultSink};

type Completed = (EpisodeParams, Result<EpisodeRecord, EpisodeError>);

/// Result of running a sweep.
#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub sweep_id: Uuid,
    /// Episodes that produced a record
    pub completed: usize,
    pub successes: usize,
    pub total_runs: u64,
    /// Episodes that ended with an error instead of a record
    pub errors: Vec<(u64, String)>,
}

impl SweepSummary {
    fn new(sweep_id: Uuid) -> Self {
        Self {
            sweep_id,
            completed: 0,
            successes: 0,
            total_runs: 0,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, record: &EpisodeRecord) {
        self.completed += 1;
        self.total_runs += u64::from(record.run_count);
        if record.is_success() {
            self.successes += 1;
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Completed: {}, Succeeded: {}, Errors: {}, Runs: {}",
            self.completed,
            self.successes,
            self.errors.len(),
            self.total_runs
        )
    }
}

/// Run every episode of `sweep`, at most `config.max_parallel` at a time.
///
/// Episodes run on blocking threads since actuators are synchronous and cannot be cancelled.
/// A single aggregator task receives finished episodes and is the only writer of `sink` and
/// the event log.
pub async fn run_sweep(
    config: &ExperimentConfig,
    catalog: Arc<dyn Catalog>,
    sweep: Sweep,
    actuator: ActuatorKind,
    sink: Box<dyn ResultSink>,
    events: Option<EventEmitter>,
) -> Result<SweepSummary> {
    let sweep_id = Uuid::new_v4();
    let workers = config.max_parallel.max(1);

    let mut contexts: HashMap<String, Result<Arc<EngineContext>, CatalogError>> = HashMap::new();
    for set in sweep.location_sets() {
        let context = EngineContext::build(catalog.as_ref(), &set).map(Arc::new);
        if let Err(e) = &context {
            warn!(set = %set, error = %e, "location set unusable");
        }
        contexts.insert(set, context);
    }

    let semaphore = Arc::new(Semaphore::new(workers));
    let (tx, rx) = mpsc::channel::<Completed>(workers * 2);
    let aggregator = tokio::spawn(aggregate(rx, sink, events, sweep_id, sweep.len()));

    info!(sweep_id = %sweep_id, episodes = sweep.len(), workers, "sweep start");
    for params in sweep.episodes {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("worker pool closed")?;
        let tx = tx.clone();
        let catalog = Arc::clone(&catalog);
        let planner = config.planner;
        let context = contexts
            .get(&params.location_set)
            .cloned()
            .unwrap_or_else(|| Err(CatalogError::not_found("location set", &params.location_set)));

        tokio::spawn(async move {
            let _permit = permit;
            let result = match context {
                Ok(context) => {
                    let job = params.clone();
                    tokio::task::spawn_blocking(move || {
                        let mut actuator = actuator.create(catalog.as_ref(), &context)?;
                        run_episode(&context, &planner, &job, actuator.as_mut())
                    })
                    .await
                    .unwrap_or_else(|e| Err(EpisodeError::Actuator(format!("worker panicked: {e}"))))
                }
                Err(e) => Err(e.into()),
            };
            let _ = tx.send((params, result)).await;
        });
    }
    drop(tx);

    let summary = aggregator.await.context("aggregator task failed")??;
    info!(sweep_id = %sweep_id, "{}", summary.summary());
    Ok(summary)
}

async fn aggregate(
    mut rx: mpsc::Receiver<Completed>,
    mut sink: Box<dyn ResultSink>,
    events: Option<EventEmitter>,
    sweep_id: Uuid,
    planned: usize,
) -> Result<SweepSummary> {
    let emit = |event: EngineEvent| {
        if let Some(emitter) = &events {
            if let Err(e) = emitter.emit(event.sweep(sweep_id)) {
                warn!(error = %e, "failed to write event");
            }
        }
    };

    emit(EngineEvent::new(SWEEP_START, format!("{planned} episodes")));
    let mut summary = SweepSummary::new(sweep_id);
    while let Some((params, result)) = rx.recv().await {
        match result {
            Ok(mut record) => {
                record.sweep_id = Some(sweep_id);
                sink.append(&record)
                    .with_context(|| format!("Failed to record episode {}", record.episode_id))?;
                summary.record(&record);
                emit(
                    EngineEvent::new(EPISODE_DONE, record.outcome_name.name())
                        .episode(record.episode_id)
                        .metadata(json!({
                            "target": record.target_item,
                            "mode": record.abstraction_mode,
                            "runs": record.run_count,
                            "replans": record.replan_count,
                        })),
                );
            }
            Err(e) => {
                warn!(episode_id = params.episode_id, error = %e, "episode failed");
                emit(EngineEvent::new(EPISODE_FAILED, e.to_string()).episode(params.episode_id));
                summary.errors.push((params.episode_id, e.to_string()));
            }
        }
    }
    emit(EngineEvent::new(SWEEP_STOP, summary.summary()));
    Ok(summary)
}
