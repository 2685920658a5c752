use construal_core::CatalogError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("unknown target item: {0}")]
    UnknownTarget(String),

    #[error("no scaling table for abstraction level {level}")]
    ScalingTableMissing { level: usize },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
