//! Deterministic actuator over a known ground-truth placement.

use construal_core::{Belief, LocIdx, LocationSet, Plan};
use tracing::trace;

use super::{Actuator, ActuatorReport, ActuatorStats, Outcome};
use crate::catalog::Catalog;
use crate::context::{belief_from_placement, EngineContext};
use crate::episode::EpisodeState;
use crate::error::EpisodeError;

/// Walks the named locations of a plan and reports what is really there.
///
/// Travel distance is the index distance between consecutive locations; every visit costs one
/// time unit.
#[derive(Debug, Clone)]
pub struct SimulatedWorld {
    truth: Belief,
    locations: LocationSet,
}

impl SimulatedWorld {
    pub fn new(truth: Belief, locations: LocationSet) -> Self {
        Self { truth, locations }
    }

    pub fn from_catalog(
        catalog: &dyn Catalog,
        context: &EngineContext,
    ) -> Result<Self, EpisodeError> {
        let placement = catalog.ground_truth(&context.set_id)?;
        let truth = belief_from_placement(&placement, &context.items, &context.locations)?;
        Ok(Self::new(truth, context.locations.clone()))
    }

    /// Named locations with something to find, in set order, starting from the one closest to
    /// `from`.
    fn route(&self, plan: &Plan, from: Option<LocIdx>) -> Vec<LocIdx> {
        let mut route: Vec<LocIdx> = plan
            .assignment()
            .rows()
            .filter(|(loc, items)| !self.locations.is_sentinel(*loc) && !items.is_empty())
            .map(|(loc, _)| loc)
            .collect();
        if let Some(from) = from {
            let closest = route
                .iter()
                .enumerate()
                .min_by_key(|(_, loc)| loc.0.abs_diff(from.0))
                .map_or(0, |(i, _)| i);
            route.rotate_left(closest);
        }
        route
    }
}

impl Actuator for SimulatedWorld {
    fn execute(
        &mut self,
        plan: &Plan,
        state: &EpisodeState,
    ) -> Result<ActuatorReport, EpisodeError> {
        let n_items = self.truth.len();
        let route = self.route(plan, state.position);
        let mut report = ActuatorReport::new(n_items, Outcome::Failure);
        report.last_position = state.position;

        if route.is_empty() {
            let held = plan.assignment().items_at(self.locations.sentinel());
            if !held.is_empty() && held.iter().all(|i| state.possession.has(*i)) {
                report.outcome = Outcome::Success;
            }
            return Ok(report);
        }

        let mut all_found = true;
        let mut position = state.position;
        for loc in route {
            report.stats += ActuatorStats {
                time: 1.0,
                distance: position.map_or(0, |p| p.0.abs_diff(loc.0)) as f64,
            };
            position = Some(loc);

            for (item, locs) in self.truth.iter() {
                if locs.contains(&loc) {
                    report.observations.confirm_present(item, loc);
                }
            }
            for item in plan.assignment().items_at(loc) {
                if self.truth.locations(*item).contains(&loc) {
                    report.acquired.push(*item);
                } else {
                    report.observations.confirm_absent(*item, loc);
                    all_found = false;
                }
            }
            trace!(location = self.locations.name(loc), all_found, "visited");
        }

        report.last_position = position;
        if all_found {
            report.outcome = Outcome::Success;
        }
        Ok(report)
    }
}
