//! Actuators - execute one plan column against an environment.

mod simulated;

use std::ops::AddAssign;

use construal_core::{ItemIdx, LocIdx, ObservationLog, Plan};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::context::EngineContext;
use crate::episode::EpisodeState;
use crate::error::EpisodeError;

pub use simulated::SimulatedWorld;

/// Result of executing a plan. Serialised names are lowercase; [`Outcome::code`] gives the
/// legacy numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    InProgress,
    Failure,
}

impl Outcome {
    pub fn code(self) -> i8 {
        match self {
            Self::Success => 1,
            Self::InProgress => 0,
            Self::Failure => -1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InProgress => "in_progress",
            Self::Failure => "failure",
        }
    }
}

/// Cumulative cost of execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorStats {
    pub time: f64,
    pub distance: f64,
}

impl AddAssign for ActuatorStats {
    fn add_assign(&mut self, rhs: Self) {
        self.time += rhs.time;
        self.distance += rhs.distance;
    }
}

/// What one plan execution produced. Observations are deltas, not the full log.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorReport {
    pub observations: ObservationLog,
    pub acquired: Vec<ItemIdx>,
    pub stats: ActuatorStats,
    pub outcome: Outcome,
    pub last_position: Option<LocIdx>,
}

impl ActuatorReport {
    pub fn new(n_items: usize, outcome: Outcome) -> Self {
        Self {
            observations: ObservationLog::new(n_items),
            acquired: Vec::new(),
            stats: ActuatorStats::default(),
            outcome,
            last_position: None,
        }
    }
}

/// Executes plans synchronously. A call may block but must return a definite outcome.
pub trait Actuator: Send {
    fn execute(&mut self, plan: &Plan, state: &EpisodeState)
        -> Result<ActuatorReport, EpisodeError>;
}

/// Available actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorKind {
    Simulated,
}

impl ActuatorKind {
    /// Parse actuator from name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "simulated" | "sim" => Some(Self::Simulated),
            _ => None,
        }
    }

    /// Get actuator name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
        }
    }

    /// Build a fresh actuator for one episode
    pub fn create(
        &self,
        catalog: &dyn Catalog,
        context: &EngineContext,
    ) -> Result<Box<dyn Actuator>, EpisodeError> {
        match self {
            Self::Simulated => Ok(Box::new(SimulatedWorld::from_catalog(catalog, context)?)),
        }
    }
}
