use thiserror::Error;

/// Failures resolving reference data (items, locations, recipes, embeddings).
///
/// These are fatal to the episode that needs the data and never defaulted silently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("no embedding resolvable for item {item}")]
    MissingEmbedding { item: String },

    #[error("embedding for item {item} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        item: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid catalog data: {0}")]
    Invalid(String),
}

impl CatalogError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
