//! One replanning cycle: reason, recall, search and review across every abstraction level.

use construal_core::{Belief, ItemIdx, ObservationLog, PlanSet, Possession};
use tracing::debug;

use crate::{review, AbstractionMode, PlanError, PlanSearch, Reasoner};

/// Per-cycle episode state the planner reads.
#[derive(Debug, Clone, Copy)]
pub struct CycleInputs<'a> {
    pub belief: &'a Belief,
    pub observations: &'a ObservationLog,
    pub possession: &'a Possession,
    pub target: ItemIdx,
    pub mode: AbstractionMode,
    /// Tie-break seed for this cycle's reviews.
    pub seed: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Planner<'a> {
    reasoner: Reasoner<'a>,
    search: PlanSearch<'a>,
}

impl<'a> Planner<'a> {
    pub fn new(reasoner: Reasoner<'a>, search: PlanSearch<'a>) -> Self {
        Self { reasoner, search }
    }

    /// Merged, ranked plans for every level of `inputs.mode`, least abstract first.
    ///
    /// An empty result means no plan could be formed; callers fall back on their own.
    pub fn plan_cycle(&self, inputs: &CycleInputs<'_>) -> Result<PlanSet, PlanError> {
        let mut merged = PlanSet::new();
        for level in inputs.mode.levels() {
            let reasoned = self.reasoner.reason(inputs.belief, inputs.mode, level)?;
            let recalled = reasoned.recall(inputs.observations);
            let found =
                self.search
                    .search(&recalled, inputs.possession, inputs.target, level.value);
            debug!(
                mode = %inputs.mode,
                level = level.index,
                found = found.len(),
                "abstraction level searched"
            );
            merged = review(found, merged, inputs.seed, None);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlannerConfig, ScalingTables};
    use construal_core::{FeatureMatrix, ItemSet, LocIdx, LocationSet, RecipeMatrix};

    #[test]
    fn recall_prunes_confirmed_absences_before_search() {
        let items = ItemSet::new(["apple"]);
        let locations = LocationSet::new(["orchard", "market"]);
        let features = FeatureMatrix::from_rows(&items, [Some(vec![1.0, 0.0])]).unwrap();
        let distances = features.cosine_distances();
        let scaling = ScalingTables::new();
        let recipes = RecipeMatrix::new(1);
        let config = PlannerConfig::default();
        let planner = Planner::new(
            Reasoner::new(&features, &distances, &locations, &scaling),
            PlanSearch::new(&recipes, &locations, &config),
        );

        let mut belief = Belief::empty(1);
        belief.insert(ItemIdx(0), LocIdx(0));
        belief.insert(ItemIdx(0), LocIdx(1));
        let mut observations = ObservationLog::new(1);
        observations.confirm_absent(ItemIdx(0), LocIdx(0));

        let plans = planner
            .plan_cycle(&CycleInputs {
                belief: &belief,
                observations: &observations,
                possession: &Possession::new(1),
                target: ItemIdx(0),
                mode: AbstractionMode::Identity,
                seed: 0,
            })
            .unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(
            plans.first().unwrap().assignment().items_at(LocIdx(1)),
            &[ItemIdx(0)]
        );
    }
}
