use construal_core::CatalogError;
use construal_planner::PlanError;
use thiserror::Error;

/// Failures that end one episode. Other episodes of the sweep are unaffected.
#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("actuator failed: {0}")]
    Actuator(String),
}
