//! Episodes - one target, mode, location set and seed, run to termination.

mod runner;
mod state;

pub use runner::{fallback_plan, run_episode, FALLBACK_STREAM, REVIEW_STREAM};
pub use state::{EpisodeParams, EpisodePhase, EpisodeState};
