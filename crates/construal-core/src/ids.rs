use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Name of the reserved row for items that no longer need to be searched for.
pub const SENTINEL_LOCATION: &str = "self";

/// Dense index of an item within an [`ItemSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemIdx(pub usize);

/// Dense index of a location within a [`LocationSet`]. The sentinel is always the last index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocIdx(pub usize);

/// Ordered item name table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSet {
    names: Vec<String>,
    index: BTreeMap<String, ItemIdx>,
}

impl ItemSet {
    /// Build from names in catalog order. Duplicate names keep their first index.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            let name = name.into();
            if set.index.contains_key(&name) {
                continue;
            }
            set.index.insert(name.clone(), ItemIdx(set.names.len()));
            set.names.push(name);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, item: ItemIdx) -> &str {
        &self.names[item.0]
    }

    pub fn get(&self, name: &str) -> Option<ItemIdx> {
        self.index.get(name).copied()
    }

    pub fn resolve(&self, name: &str) -> Result<ItemIdx, CatalogError> {
        self.get(name)
            .ok_or_else(|| CatalogError::not_found("item", name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemIdx, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (ItemIdx(i), name.as_str()))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Ordered, fixed-size location table with the sentinel appended after the named locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSet {
    names: Vec<String>,
    index: BTreeMap<String, LocIdx>,
}

impl LocationSet {
    /// Build from the named locations of one location-set configuration.
    ///
    /// Blank names and the sentinel name itself are skipped; the sentinel is always re-added at
    /// the end.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self {
            names: Vec::new(),
            index: BTreeMap::new(),
        };
        for name in names {
            let name = name.into();
            let name = name.trim();
            if name.is_empty() || name == SENTINEL_LOCATION || out.index.contains_key(name) {
                continue;
            }
            out.index.insert(name.to_string(), LocIdx(out.names.len()));
            out.names.push(name.to_string());
        }
        out
    }

    /// Number of named locations (sentinel excluded).
    pub fn named_len(&self) -> usize {
        self.names.len()
    }

    /// Number of rows in a plan (sentinel included).
    pub fn len(&self) -> usize {
        self.names.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn sentinel(&self) -> LocIdx {
        LocIdx(self.names.len())
    }

    pub fn is_sentinel(&self, loc: LocIdx) -> bool {
        loc.0 == self.names.len()
    }

    pub fn contains(&self, loc: LocIdx) -> bool {
        loc.0 <= self.names.len()
    }

    pub fn name(&self, loc: LocIdx) -> &str {
        if self.is_sentinel(loc) {
            SENTINEL_LOCATION
        } else {
            &self.names[loc.0]
        }
    }

    /// Look up a location by name. The sentinel name resolves to the sentinel index.
    pub fn get(&self, name: &str) -> Option<LocIdx> {
        if name == SENTINEL_LOCATION {
            return Some(self.sentinel());
        }
        self.index.get(name).copied()
    }

    pub fn resolve(&self, name: &str) -> Result<LocIdx, CatalogError> {
        self.get(name)
            .ok_or_else(|| CatalogError::not_found("location", name))
    }

    /// Named locations in configured order.
    pub fn named(&self) -> impl Iterator<Item = LocIdx> {
        (0..self.names.len()).map(LocIdx)
    }
}
