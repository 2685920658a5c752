use std::time::Duration;

use construal_core::{
    Belief, ItemIdx, LocIdx, LocationSet, ObservationLog, Plan, Possession,
};
use construal_planner::AbstractionMode;

use crate::actuator::{ActuatorReport, ActuatorStats, Outcome};

/// One combination of sweep conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeParams {
    pub episode_id: u64,
    pub target: String,
    pub mode: AbstractionMode,
    pub location_set: String,
    pub plans_per_replan: usize,
    pub seed: u64,
    pub max_runs: u32,
    pub stop_on_convergence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    Planning,
    Executing,
    ReviewingObservations,
    Terminated,
}

/// Mutable state of one episode. Discarded when the episode ends.
#[derive(Debug, Clone)]
pub struct EpisodeState {
    pub target: ItemIdx,
    pub phase: EpisodePhase,
    pub belief: Belief,
    pub observations: ObservationLog,
    pub possession: Possession,
    pub run_count: u32,
    pub replan_count: u32,
    pub no_plan_count: u32,
    pub plan_time: Duration,
    pub run_time: Duration,
    pub stats: ActuatorStats,
    pub position: Option<LocIdx>,
    pub last_plan: Option<Plan>,
    pub outcome: Outcome,
}

impl EpisodeState {
    pub fn new(belief: Belief, target: ItemIdx) -> Self {
        let n_items = belief.len();
        Self {
            target,
            phase: EpisodePhase::Planning,
            belief,
            observations: ObservationLog::new(n_items),
            possession: Possession::new(n_items),
            run_count: 0,
            replan_count: 0,
            no_plan_count: 0,
            plan_time: Duration::ZERO,
            run_time: Duration::ZERO,
            stats: ActuatorStats::default(),
            position: None,
            last_plan: None,
            outcome: Outcome::InProgress,
        }
    }

    /// State over `n_items` with nothing believed.
    pub fn blank(n_items: usize, target: ItemIdx) -> Self {
        Self::new(Belief::empty(n_items), target)
    }

    /// Merge one actuator report.
    pub fn absorb(&mut self, report: ActuatorReport) {
        self.observations.merge(&report.observations);
        for item in report.acquired {
            self.possession.acquire(item);
        }
        self.stats += report.stats;
        if report.last_position.is_some() {
            self.position = report.last_position;
        }
        self.outcome = report.outcome;
    }

    /// Fold everything observed so far into the persistent belief.
    pub fn revise(&mut self, locations: &LocationSet) {
        self.belief = self.belief.revise(&self.observations, locations);
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}
