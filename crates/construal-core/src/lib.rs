//! Deterministic, engine-agnostic primitives for construal-based search planning.
//!
//! Items and locations are addressed by dense indices resolved once from name tables. Belief,
//! observation and possession state, the recipe/feature/location matrices and the scored plan
//! types all live here so the planner and the episode runtime share one vocabulary.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod belief;
pub mod error;
pub mod ids;
pub mod matrix;
pub mod plan;
pub mod rng;

pub use belief::{Belief, ObservationLog, Possession};
pub use error::CatalogError;
pub use ids::{ItemIdx, ItemSet, LocIdx, LocationSet, SENTINEL_LOCATION};
pub use matrix::{
    cosine_distance, DistanceMatrix, FeatureMatrix, ItemMask, LocationMatrix, RecipeMatrix,
};
pub use plan::{Assignment, NamedPlan, NamedRow, Penalties, Plan, PlanSet, ScoreWeights};
pub use rng::{derive_seed, DeterministicRng, SplitMix64};
