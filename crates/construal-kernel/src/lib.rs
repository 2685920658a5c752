//! Construal kernel - runs planning episodes end to end.
//!
//! This crate resolves catalog data into engine matrices, drives the belief
//! revision loop against an actuator, and schedules sweeps of independent
//! episodes onto a bounded worker pool with a single result aggregator.

pub mod actuator;
pub mod catalog;
pub mod config;
pub mod context;
pub mod episode;
pub mod error;
pub mod kernel;
pub mod observability;
pub mod results;

pub use actuator::{Actuator, ActuatorKind, ActuatorReport, ActuatorStats, Outcome, SimulatedWorld};
pub use catalog::{Catalog, CatalogDocument, DocumentCatalog};
pub use config::ExperimentConfig;
pub use context::EngineContext;
pub use episode::{run_episode, EpisodeParams, EpisodePhase, EpisodeState};
pub use error::EpisodeError;
pub use kernel::{run_sweep, Sweep, SweepSummary};
pub use results::{EpisodeRecord, JsonlResultSink, MemoryResultSink, ResultSink};
