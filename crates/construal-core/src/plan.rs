//! Scored search plans: a location-to-items assignment plus make/loc/mod penalties.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ItemIdx, ItemSet, LocIdx, LocationSet, Possession, SENTINEL_LOCATION};

/// Location rows of a plan (sentinel row last), each holding the items to search for there.
///
/// Items within a row are kept sorted so two assignments compare equal iff they describe the
/// same search.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    rows: Vec<Vec<ItemIdx>>,
}

impl Assignment {
    /// Assignment with `n_rows` empty rows (named locations + sentinel).
    pub fn empty(n_rows: usize) -> Self {
        Self {
            rows: vec![Vec::new(); n_rows],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn assign(&mut self, loc: LocIdx, item: ItemIdx) {
        let row = &mut self.rows[loc.0];
        if let Err(pos) = row.binary_search(&item) {
            row.insert(pos, item);
        }
    }

    pub fn items_at(&self, loc: LocIdx) -> &[ItemIdx] {
        &self.rows[loc.0]
    }

    pub fn rows(&self) -> impl Iterator<Item = (LocIdx, &[ItemIdx])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(k, items)| (LocIdx(k), items.as_slice()))
    }

    /// No item resolved to any row, sentinel included.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    fn sentinel(&self) -> LocIdx {
        LocIdx(self.rows.len() - 1)
    }

    /// Count of non-sentinel rows with a non-empty item list.
    pub fn visited_locations(&self) -> u32 {
        let sentinel = self.sentinel();
        self.rows()
            .filter(|(loc, items)| *loc != sentinel && !items.is_empty())
            .count() as u32
    }

    /// Move every possessed item out of its named row and into the sentinel row.
    pub fn with_possession(mut self, possession: &Possession) -> Self {
        let sentinel = self.sentinel();
        let mut moved = Vec::new();
        for row in &mut self.rows[..sentinel.0] {
            row.retain(|item| {
                if possession.has(*item) {
                    moved.push(*item);
                    false
                } else {
                    true
                }
            });
        }
        for item in moved {
            self.assign(sentinel, item);
        }
        self
    }
}

/// Normalisers of the multiplicative score.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ScoreWeights {
    /// Deepest recipe expansion (make penalty at which the make factor reaches zero).
    pub max_make: f64,
    /// Location count at which the loc factor reaches zero.
    pub loc_scale: f64,
    /// Abstraction level at which the mod factor reaches zero.
    pub mod_scale: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            max_make: 4.0,
            loc_scale: 18.0,
            mod_scale: 3.0,
        }
    }
}

/// Cost dimensions of a plan.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Penalties {
    /// Recipe-expansion depth used (0..=4).
    pub make: u32,
    /// Distinct non-sentinel locations visited.
    pub loc: u32,
    /// Abstraction level that produced the belief.
    pub modifier: f64,
}

impl Penalties {
    /// `1.0` when nothing needs visiting, else the rounded product of the three factors.
    pub fn score(&self, weights: &ScoreWeights) -> f64 {
        if self.loc == 0 {
            return 1.0;
        }
        let make = 1.0 - f64::from(self.make) / weights.max_make;
        let loc = 1.0 - f64::from(self.loc) / weights.loc_scale;
        let modifier = 1.0 - self.modifier / weights.mod_scale;
        ((make * loc * modifier) * 1000.0).round() / 1000.0
    }
}

/// An immutable, scored plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plan {
    assignment: Assignment,
    penalties: Penalties,
    score: f64,
}

impl Plan {
    /// Score an assignment. The `loc` penalty is derived from the assignment itself.
    pub fn new(assignment: Assignment, make: u32, modifier: f64, weights: &ScoreWeights) -> Self {
        let penalties = Penalties {
            make,
            loc: assignment.visited_locations(),
            modifier,
        };
        let score = penalties.score(weights);
        Self {
            assignment,
            penalties,
            score,
        }
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn penalties(&self) -> Penalties {
        self.penalties
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Every item is already possessed: nothing left to search for.
    pub fn is_converged(&self) -> bool {
        self.score >= 1.0
    }

    /// Map indices back to names.
    ///
    /// Panics if the plan was built against a different location set; Plan Search only emits
    /// rows of the configured set, so a mismatch is a contract violation.
    pub fn to_named(&self, items: &ItemSet, locations: &LocationSet) -> NamedPlan {
        assert_eq!(
            self.assignment.n_rows(),
            locations.len(),
            "plan rows do not match the location set"
        );
        let rows = self
            .assignment
            .rows()
            .map(|(loc, row)| NamedRow {
                location: locations.name(loc).to_string(),
                items: row.iter().map(|i| items.name(*i).to_string()).collect(),
            })
            .collect();
        NamedPlan {
            rows,
            penalty_make: self.penalties.make,
            penalty_loc: self.penalties.loc,
            penalty_mod: self.penalties.modifier,
            score: self.score,
        }
    }
}

/// Ordered, deduplicated plan collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanSet {
    plans: Vec<Plan>,
}

impl PlanSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn first(&self) -> Option<&Plan> {
        self.plans.first()
    }

    pub fn get(&self, index: usize) -> Option<&Plan> {
        self.plans.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Plan> {
        self.plans.iter()
    }

    pub fn contains_assignment(&self, assignment: &Assignment) -> bool {
        self.plans.iter().any(|p| p.assignment() == assignment)
    }

    /// Append unless an equal assignment is already present. Returns whether it was added.
    pub fn insert(&mut self, plan: Plan) -> bool {
        if self.contains_assignment(plan.assignment()) {
            return false;
        }
        self.plans.push(plan);
        true
    }

    pub fn truncate(&mut self, len: usize) {
        self.plans.truncate(len);
    }

    pub fn into_vec(self) -> Vec<Plan> {
        self.plans
    }
}

impl FromIterator<Plan> for PlanSet {
    fn from_iter<T: IntoIterator<Item = Plan>>(iter: T) -> Self {
        let mut set = PlanSet::new();
        for plan in iter {
            set.insert(plan);
        }
        set
    }
}

impl IntoIterator for PlanSet {
    type Item = Plan;
    type IntoIter = std::vec::IntoIter<Plan>;

    fn into_iter(self) -> Self::IntoIter {
        self.plans.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlanSet {
    type Item = &'a Plan;
    type IntoIter = std::slice::Iter<'a, Plan>;

    fn into_iter(self) -> Self::IntoIter {
        self.plans.iter()
    }
}

/// One location row with item names.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NamedRow {
    pub location: String,
    pub items: Vec<String>,
}

/// A plan with indices mapped back to catalog names.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NamedPlan {
    pub rows: Vec<NamedRow>,
    pub penalty_make: u32,
    pub penalty_loc: u32,
    pub penalty_mod: f64,
    pub score: f64,
}

impl NamedPlan {
    /// Named locations that actually need visiting.
    pub fn visits(&self) -> impl Iterator<Item = &NamedRow> {
        self.rows
            .iter()
            .filter(|row| row.location != SENTINEL_LOCATION && !row.items.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> ScoreWeights {
        ScoreWeights::default()
    }

    #[test]
    fn zero_locations_scores_one_regardless_of_other_penalties() {
        for modifier in [0.0, 1.0, 2.0] {
            let p = Penalties {
                make: 3,
                loc: 0,
                modifier,
            };
            assert_eq!(p.score(&weights()), 1.0);
        }
    }

    #[test]
    fn single_known_location_scores_just_under_one() {
        let p = Penalties {
            make: 0,
            loc: 1,
            modifier: 0.0,
        };
        assert_eq!(p.score(&weights()), 0.944);
    }

    #[test]
    fn score_strictly_decreases_in_make_and_loc() {
        for modifier in [0.0, 0.8, 1.0, 2.0] {
            for loc in 1..18 {
                for make in 0..4 {
                    let here = Penalties { make, loc, modifier }.score(&weights());
                    let deeper = Penalties {
                        make: make + 1,
                        loc,
                        modifier,
                    }
                    .score(&weights());
                    let wider = Penalties {
                        make,
                        loc: loc + 1,
                        modifier,
                    }
                    .score(&weights());
                    assert!(deeper < here, "make {make} loc {loc} mod {modifier}");
                    assert!(wider < here, "make {make} loc {loc} mod {modifier}");
                }
            }
        }
    }

    #[test]
    fn possession_moves_items_to_sentinel_row() {
        let mut a = Assignment::empty(3);
        a.assign(LocIdx(0), ItemIdx(1));
        a.assign(LocIdx(0), ItemIdx(0));
        a.assign(LocIdx(1), ItemIdx(2));

        let mut held = Possession::new(3);
        held.acquire(ItemIdx(0));
        held.acquire(ItemIdx(1));

        let a = a.with_possession(&held);
        assert!(a.items_at(LocIdx(0)).is_empty());
        assert_eq!(a.items_at(LocIdx(2)), &[ItemIdx(0), ItemIdx(1)]);
        assert_eq!(a.visited_locations(), 1);
    }

    #[test]
    fn plan_set_rejects_duplicate_assignments() {
        let mut a = Assignment::empty(2);
        a.assign(LocIdx(0), ItemIdx(0));
        let mut set = PlanSet::new();
        assert!(set.insert(Plan::new(a.clone(), 0, 0.0, &weights())));
        assert!(!set.insert(Plan::new(a, 2, 1.0, &weights())));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn named_plan_lists_only_rows_to_visit() {
        let items = ItemSet::new(["stick", "planks"]);
        let locations = LocationSet::new(["farm", "lake"]);
        let mut a = Assignment::empty(locations.len());
        a.assign(LocIdx(1), ItemIdx(0));
        a.assign(locations.sentinel(), ItemIdx(1));
        let named = Plan::new(a, 1, 0.0, &weights()).to_named(&items, &locations);
        let visits: Vec<_> = named.visits().collect();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].location, "lake");
        assert_eq!(visits[0].items, vec!["stick".to_string()]);
        assert_eq!(named.rows.len(), 3);
    }
}
