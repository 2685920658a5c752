//! Per-item belief, search feedback, and possession state for one episode.

use std::collections::BTreeSet;

use crate::{ItemIdx, LocIdx, LocationSet};

/// Mapping from each item to the set of locations it is believed to occupy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Belief {
    per_item: Vec<BTreeSet<LocIdx>>,
}

impl Belief {
    /// Belief with no known locations for `n_items` items.
    pub fn empty(n_items: usize) -> Self {
        Self {
            per_item: vec![BTreeSet::new(); n_items],
        }
    }

    pub fn len(&self) -> usize {
        self.per_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_item.is_empty()
    }

    pub fn locations(&self, item: ItemIdx) -> &BTreeSet<LocIdx> {
        &self.per_item[item.0]
    }

    pub fn insert(&mut self, item: ItemIdx, loc: LocIdx) -> bool {
        self.per_item[item.0].insert(loc)
    }

    pub fn extend(&mut self, item: ItemIdx, locs: impl IntoIterator<Item = LocIdx>) {
        self.per_item[item.0].extend(locs);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemIdx, &BTreeSet<LocIdx>)> {
        self.per_item
            .iter()
            .enumerate()
            .map(|(i, locs)| (ItemIdx(i), locs))
    }

    /// Drop every location already confirmed absent for that item.
    pub fn recall(&self, log: &ObservationLog) -> Belief {
        let mut out = self.clone();
        for (i, locs) in out.per_item.iter_mut().enumerate() {
            for loc in log.absent(ItemIdx(i)) {
                locs.remove(loc);
            }
        }
        out
    }

    /// Fold confirmed observations into the persistent belief.
    ///
    /// Confirmed-present locations are added, confirmed-absent ones removed, and anything that is
    /// not a named location of `locations` is dropped.
    pub fn revise(&self, log: &ObservationLog, locations: &LocationSet) -> Belief {
        let mut out = self.clone();
        for (i, locs) in out.per_item.iter_mut().enumerate() {
            let item = ItemIdx(i);
            locs.extend(log.present(item).iter().copied());
            for loc in log.absent(item) {
                locs.remove(loc);
            }
            locs.retain(|loc| loc.0 < locations.named_len());
        }
        out
    }
}

/// Locations confirmed present / confirmed absent per item, accumulated over one episode.
///
/// Nothing is ever forgotten: there is no removal API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationLog {
    present: Vec<BTreeSet<LocIdx>>,
    absent: Vec<BTreeSet<LocIdx>>,
}

impl ObservationLog {
    pub fn new(n_items: usize) -> Self {
        Self {
            present: vec![BTreeSet::new(); n_items],
            absent: vec![BTreeSet::new(); n_items],
        }
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    pub fn confirm_present(&mut self, item: ItemIdx, loc: LocIdx) -> bool {
        self.present[item.0].insert(loc)
    }

    pub fn confirm_absent(&mut self, item: ItemIdx, loc: LocIdx) -> bool {
        self.absent[item.0].insert(loc)
    }

    pub fn present(&self, item: ItemIdx) -> &BTreeSet<LocIdx> {
        &self.present[item.0]
    }

    pub fn absent(&self, item: ItemIdx) -> &BTreeSet<LocIdx> {
        &self.absent[item.0]
    }

    /// Union another log (typically one actuator report) into this one.
    pub fn merge(&mut self, other: &ObservationLog) {
        debug_assert_eq!(self.len(), other.len());
        for (mine, theirs) in self.present.iter_mut().zip(&other.present) {
            mine.extend(theirs.iter().copied());
        }
        for (mine, theirs) in self.absent.iter_mut().zip(&other.absent) {
            mine.extend(theirs.iter().copied());
        }
    }

    /// Total number of confirmed (item, location) sightings.
    pub fn present_count(&self) -> usize {
        self.present.iter().map(BTreeSet::len).sum()
    }
}

/// Per-item possession flags. Set once an item is acquired and never cleared within an episode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Possession {
    held: Vec<bool>,
}

impl Possession {
    pub fn new(n_items: usize) -> Self {
        Self {
            held: vec![false; n_items],
        }
    }

    pub fn acquire(&mut self, item: ItemIdx) {
        self.held[item.0] = true;
    }

    pub fn has(&self, item: ItemIdx) -> bool {
        self.held.get(item.0).copied().unwrap_or(false)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn locs() -> LocationSet {
        LocationSet::new(["farm", "lake", "store"])
    }

    #[test]
    fn recall_removes_confirmed_absent_locations_only() {
        let mut belief = Belief::empty(2);
        belief.extend(ItemIdx(0), [LocIdx(0), LocIdx(1)]);
        belief.insert(ItemIdx(1), LocIdx(1));

        let mut log = ObservationLog::new(2);
        log.confirm_absent(ItemIdx(0), LocIdx(1));

        let recalled = belief.recall(&log);
        assert_eq!(
            recalled.locations(ItemIdx(0)).iter().copied().collect::<Vec<_>>(),
            vec![LocIdx(0)]
        );
        assert!(recalled.locations(ItemIdx(1)).contains(&LocIdx(1)));
        // The persistent belief is untouched.
        assert_eq!(belief.locations(ItemIdx(0)).len(), 2);
    }

    #[test]
    fn revise_adds_sightings_and_drops_sentinel_and_absent() {
        let locations = locs();
        let mut belief = Belief::empty(2);
        belief.extend(ItemIdx(0), [LocIdx(0), locations.sentinel()]);

        let mut log = ObservationLog::new(2);
        log.confirm_present(ItemIdx(1), LocIdx(2));
        log.confirm_absent(ItemIdx(0), LocIdx(0));

        let revised = belief.revise(&log, &locations);
        assert!(revised.locations(ItemIdx(0)).is_empty());
        assert_eq!(
            revised.locations(ItemIdx(1)).iter().copied().collect::<Vec<_>>(),
            vec![LocIdx(2)]
        );
    }

    #[test]
    fn possession_is_sticky() {
        let mut held = Possession::new(3);
        held.acquire(ItemIdx(2));
        held.acquire(ItemIdx(2));
        assert!(held.has(ItemIdx(2)));
        assert!(!held.has(ItemIdx(0)));
        assert!(!held.has(ItemIdx(7)));
    }
}
