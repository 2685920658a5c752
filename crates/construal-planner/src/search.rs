//! Plan search: recipe expansion projected through the location matrix.

use construal_core::{
    Assignment, Belief, ItemIdx, ItemMask, LocIdx, LocationMatrix, LocationSet, Plan, PlanSet,
    Possession, RecipeMatrix,
};
use itertools::Itertools;
use tracing::{debug, warn};

use crate::PlannerConfig;

/// Deepest recipe-substitution level searched (levels `0..=MAX_RECIPE_DEPTH`).
pub const MAX_RECIPE_DEPTH: u32 = 4;

/// Expands a target item into scored plans against one belief.
#[derive(Debug, Clone, Copy)]
pub struct PlanSearch<'a> {
    recipes: &'a RecipeMatrix,
    locations: &'a LocationSet,
    config: &'a PlannerConfig,
}

impl<'a> PlanSearch<'a> {
    pub fn new(
        recipes: &'a RecipeMatrix,
        locations: &'a LocationSet,
        config: &'a PlannerConfig,
    ) -> Self {
        Self {
            recipes,
            locations,
            config,
        }
    }

    /// Search levels `0..=MAX_RECIPE_DEPTH` until one resolves.
    ///
    /// Each plan's `make` penalty is the level that produced it and every plan carries the same
    /// `modifier` (the abstraction level of `belief`). Returns an empty set when nothing along
    /// the decomposition chain can be located.
    pub fn search(
        &self,
        belief: &Belief,
        possession: &Possession,
        target: ItemIdx,
        modifier: f64,
    ) -> PlanSet {
        let matrix = LocationMatrix::build(belief, self.locations);
        let mut mask = ItemMask::single(belief.len(), target);
        let mut plans = PlanSet::new();

        for level in 0..=MAX_RECIPE_DEPTH {
            for assignment in self.project(&matrix, &mask, possession) {
                plans.insert(Plan::new(
                    assignment.with_possession(possession),
                    level,
                    modifier,
                    &self.config.weights,
                ));
            }
            if !plans.is_empty() {
                debug!(level, plans = plans.len(), "search resolved");
                break;
            }

            let next = substitute(self.recipes, &mask);
            if next == mask {
                debug!(level, "decomposition reached a fixed point");
                break;
            }
            mask = next;
        }
        plans
    }

    /// `Lᵗ · x`, branching over every combination of per-item candidate locations.
    ///
    /// A possessed item resolves to the sentinel alone, and nothing else may resolve there. If
    /// any item in `mask` has no candidate location the level cannot be resolved and nothing is
    /// produced. Past `max_combinations`, combinations visiting fewer locations are kept first.
    fn project(
        &self,
        matrix: &LocationMatrix,
        mask: &ItemMask,
        possession: &Possession,
    ) -> Vec<Assignment> {
        if mask.is_empty() {
            return Vec::new();
        }
        let items: Vec<ItemIdx> = mask.items().collect();
        let candidates: Vec<Vec<LocIdx>> = items
            .iter()
            .map(|item| {
                if possession.has(*item) {
                    vec![self.locations.sentinel()]
                } else {
                    matrix
                        .locations_of(*item)
                        .filter(|loc| !self.locations.is_sentinel(*loc))
                        .collect()
                }
            })
            .collect();
        if candidates.iter().any(Vec::is_empty) {
            return Vec::new();
        }

        let cap = self.config.max_combinations;
        let total = candidates
            .iter()
            .fold(1usize, |acc, c| acc.saturating_mul(c.len()));
        let choices: Vec<Vec<LocIdx>> = if total <= cap {
            candidates.into_iter().multi_cartesian_product().collect()
        } else {
            warn!(total, cap, "location combinations truncated");
            self.fewest_visits_first(&candidates, cap)
        };

        choices
            .into_iter()
            .map(|choice| {
                let mut assignment = Assignment::empty(self.locations.len());
                for (item, loc) in items.iter().zip(choice) {
                    assignment.assign(loc, *item);
                }
                assignment
            })
            .collect()
    }

    /// Up to `cap` combinations, ordered by how many named locations they visit.
    ///
    /// For each visit count `k`, every `k`-subset of candidate locations is tried in index order
    /// and contributes the combinations that use all of it.
    fn fewest_visits_first(&self, candidates: &[Vec<LocIdx>], cap: usize) -> Vec<Vec<LocIdx>> {
        let sentinel = self.locations.sentinel();
        let pool: Vec<LocIdx> = candidates
            .iter()
            .flatten()
            .copied()
            .filter(|loc| *loc != sentinel)
            .sorted()
            .dedup()
            .collect();
        let free = candidates.iter().filter(|c| c[..] != [sentinel]).count();

        let mut out = Vec::with_capacity(cap);
        for k in 1..=free.min(pool.len()) {
            for subset in pool.iter().copied().combinations(k) {
                let restricted: Vec<Vec<LocIdx>> = candidates
                    .iter()
                    .map(|c| {
                        c.iter()
                            .copied()
                            .filter(|loc| *loc == sentinel || subset.contains(loc))
                            .collect()
                    })
                    .collect();
                if restricted.iter().any(Vec::is_empty) {
                    continue;
                }
                let covering = restricted
                    .into_iter()
                    .multi_cartesian_product()
                    .filter(|choice| subset.iter().all(|loc| choice.contains(loc)));
                for choice in covering {
                    out.push(choice);
                    if out.len() == cap {
                        return out;
                    }
                }
            }
        }
        out
    }
}

/// Replace every decomposable item of `mask` by its immediate ingredients.
///
/// Items without a recipe are carried forward unchanged.
pub fn substitute(recipes: &RecipeMatrix, mask: &ItemMask) -> ItemMask {
    let mut next = recipes.ingredient_mask(mask);
    for item in mask.items() {
        if !recipes.has_recipe(item) {
            next.insert(item);
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    // items: 0 = planks, 1 = log, 2 = stick, 3 = torch, 4 = coal
    fn recipes() -> RecipeMatrix {
        RecipeMatrix::from_edges(
            5,
            [
                (ItemIdx(0), ItemIdx(1), 1),
                (ItemIdx(2), ItemIdx(0), 2),
                (ItemIdx(3), ItemIdx(2), 1),
                (ItemIdx(3), ItemIdx(4), 1),
            ],
        )
    }

    fn locations() -> LocationSet {
        LocationSet::new(["forest", "mine", "village"])
    }

    #[test]
    fn substitute_carries_forward_undecomposable_items() {
        let r = recipes();
        let mut mask = ItemMask::zeros(5);
        mask.insert(ItemIdx(2));
        mask.insert(ItemIdx(4));
        let next = substitute(&r, &mask);
        assert!(next.contains(ItemIdx(0)));
        assert!(next.contains(ItemIdx(4)));
        assert!(!next.contains(ItemIdx(2)));
        assert_eq!(next.count(), 2);
    }

    #[test]
    fn direct_belief_resolves_at_level_zero() {
        let r = recipes();
        let locs = locations();
        let config = PlannerConfig::default();
        let mut belief = Belief::empty(5);
        belief.insert(ItemIdx(3), LocIdx(2));

        let plans = PlanSearch::new(&r, &locs, &config).search(
            &belief,
            &Possession::new(5),
            ItemIdx(3),
            0.0,
        );
        assert_eq!(plans.len(), 1);
        let plan = plans.first().unwrap();
        assert_eq!(plan.penalties().make, 0);
        assert_eq!(plan.assignment().items_at(LocIdx(2)), &[ItemIdx(3)]);
        assert_eq!(plan.score(), 0.944);
    }

    #[test]
    fn unknown_target_expands_into_ingredient_combinations() {
        let r = recipes();
        let locs = locations();
        let config = PlannerConfig::default();
        let mut belief = Belief::empty(5);
        belief.insert(ItemIdx(2), LocIdx(0));
        belief.insert(ItemIdx(2), LocIdx(2));
        belief.insert(ItemIdx(4), LocIdx(1));

        let plans = PlanSearch::new(&r, &locs, &config).search(
            &belief,
            &Possession::new(5),
            ItemIdx(3),
            0.8,
        );
        assert_eq!(plans.len(), 2);
        for plan in &plans {
            assert_eq!(plan.penalties().make, 1);
            assert_eq!(plan.penalties().loc, 2);
            assert_eq!(plan.penalties().modifier, 0.8);
            assert_eq!(plan.assignment().items_at(LocIdx(1)), &[ItemIdx(4)]);
        }
    }

    #[test]
    fn partially_located_level_does_not_resolve() {
        let r = recipes();
        let locs = locations();
        let config = PlannerConfig::default();
        let mut belief = Belief::empty(5);
        // stick known, coal unknown: level 1 fails, level 2 swaps stick for planks (unknown).
        belief.insert(ItemIdx(2), LocIdx(0));

        let plans = PlanSearch::new(&r, &locs, &config).search(
            &belief,
            &Possession::new(5),
            ItemIdx(3),
            0.0,
        );
        assert!(plans.is_empty());
    }

    #[test]
    fn possessed_target_needs_no_visits() {
        let r = recipes();
        let locs = locations();
        let config = PlannerConfig::default();
        let mut held = Possession::new(5);
        held.acquire(ItemIdx(1));

        let plans =
            PlanSearch::new(&r, &locs, &config).search(&Belief::empty(5), &held, ItemIdx(1), 1.0);
        let plan = plans.first().unwrap();
        assert_eq!(plan.assignment().items_at(locs.sentinel()), &[ItemIdx(1)]);
        assert_eq!(plan.penalties().loc, 0);
        assert!(plan.is_converged());
    }

    #[test]
    fn combinations_are_capped() {
        let r = RecipeMatrix::from_edges(3, [(ItemIdx(0), ItemIdx(1), 1), (ItemIdx(0), ItemIdx(2), 1)]);
        let locs = locations();
        let config = PlannerConfig {
            max_combinations: 4,
            ..PlannerConfig::default()
        };
        let mut belief = Belief::empty(3);
        for item in [ItemIdx(1), ItemIdx(2)] {
            belief.extend(item, locs.named());
        }
        let plans = PlanSearch::new(&r, &locs, &config).search(
            &belief,
            &Possession::new(3),
            ItemIdx(0),
            0.0,
        );
        assert_eq!(plans.len(), 4);
        let visits: Vec<u32> = plans.iter().map(|p| p.penalties().loc).collect();
        assert_eq!(visits, vec![1, 1, 1, 2]);
    }

    #[test]
    fn capped_search_keeps_every_single_visit_plan() {
        let r = RecipeMatrix::from_edges(
            4,
            [
                (ItemIdx(0), ItemIdx(1), 1),
                (ItemIdx(0), ItemIdx(2), 1),
                (ItemIdx(0), ItemIdx(3), 1),
            ],
        );
        let names: Vec<String> = (0..18).map(|i| format!("l{i}")).collect();
        let locs = LocationSet::new(names);
        let config = PlannerConfig::default();
        let mut belief = Belief::empty(4);
        for item in [ItemIdx(1), ItemIdx(2), ItemIdx(3)] {
            belief.extend(item, locs.named());
        }

        let plans = PlanSearch::new(&r, &locs, &config).search(
            &belief,
            &Possession::new(4),
            ItemIdx(0),
            0.0,
        );
        assert_eq!(plans.len(), config.max_combinations);
        let single: Vec<LocIdx> = plans
            .iter()
            .filter(|p| p.penalties().loc == 1)
            .filter_map(|p| p.assignment().rows().find(|(_, items)| !items.is_empty()))
            .map(|(loc, _)| loc)
            .collect();
        assert_eq!(single, locs.named().collect::<Vec<_>>());
        assert!(plans.iter().all(|p| p.penalties().loc <= 3));
    }

    #[test]
    fn sentinel_belief_is_not_a_location_for_unheld_items() {
        let r = recipes();
        let locs = locations();
        let config = PlannerConfig::default();
        let mut belief = Belief::empty(5);
        belief.insert(ItemIdx(1), locs.sentinel());

        let search = PlanSearch::new(&r, &locs, &config);
        assert!(search
            .search(&belief, &Possession::new(5), ItemIdx(1), 0.0)
            .is_empty());

        belief.insert(ItemIdx(1), LocIdx(0));
        let plans = search.search(&belief, &Possession::new(5), ItemIdx(1), 0.0);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans.first().unwrap().penalties().loc, 1);
        assert!(!plans.first().unwrap().is_converged());
    }
}
