//! Kernel - expanding sweeps and running their episodes.

mod runner;
mod scheduler;

pub use runner::{run_sweep, SweepSummary};
pub use scheduler::{sample_targets, Sweep};
