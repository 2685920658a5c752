//! Construal planning engine.
//!
//! Turns a partial per-item belief about locations into a ranked set of executable search
//! plans: an abstraction step generalizes the belief ([`reasoner`]), a bounded recipe expansion
//! projects the target through the location matrix ([`search`]), and a review step merges,
//! deduplicates and ranks candidates across abstraction levels ([`review`]). [`Planner`] runs
//! one full replanning cycle.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod planner;
pub mod reasoner;
pub mod review;
pub mod search;

pub use config::PlannerConfig;
pub use error::PlanError;
pub use planner::{CycleInputs, Planner};
pub use reasoner::{AbstractionMode, Level, Reasoner, ScalingTables};
pub use review::review;
pub use search::{substitute, PlanSearch, MAX_RECIPE_DEPTH};
