//! Dense matrices built once per run (recipe, feature) or per belief change (location).

use crate::{Belief, CatalogError, ItemIdx, ItemSet, LocIdx, LocationSet};

/// Item indicator vector (one flag per item).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemMask {
    bits: Vec<bool>,
}

impl ItemMask {
    pub fn zeros(n_items: usize) -> Self {
        Self {
            bits: vec![false; n_items],
        }
    }

    /// Indicator with a single 1 at `item`.
    pub fn single(n_items: usize, item: ItemIdx) -> Self {
        let mut mask = Self::zeros(n_items);
        mask.insert(item);
        mask
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn insert(&mut self, item: ItemIdx) {
        self.bits[item.0] = true;
    }

    pub fn contains(&self, item: ItemIdx) -> bool {
        self.bits.get(item.0).copied().unwrap_or(false)
    }

    /// True when no bit is set.
    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Set items in ascending index order.
    pub fn items(&self) -> impl Iterator<Item = ItemIdx> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| ItemIdx(i))
    }
}

/// `R[i][j]` = count of item `j` required to build item `i` (0 when unrelated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeMatrix {
    n: usize,
    counts: Vec<u32>,
}

impl RecipeMatrix {
    pub fn new(n_items: usize) -> Self {
        Self {
            n: n_items,
            counts: vec![0; n_items * n_items],
        }
    }

    /// Build from `(product, ingredient, count)` edges. Repeated edges overwrite.
    pub fn from_edges(
        n_items: usize,
        edges: impl IntoIterator<Item = (ItemIdx, ItemIdx, u32)>,
    ) -> Self {
        let mut matrix = Self::new(n_items);
        for (product, ingredient, count) in edges {
            matrix.set(product, ingredient, count);
        }
        matrix
    }

    pub fn n_items(&self) -> usize {
        self.n
    }

    pub fn get(&self, product: ItemIdx, ingredient: ItemIdx) -> u32 {
        self.counts[product.0 * self.n + ingredient.0]
    }

    pub fn set(&mut self, product: ItemIdx, ingredient: ItemIdx, count: u32) {
        self.counts[product.0 * self.n + ingredient.0] = count;
    }

    /// Non-zero ingredients of `product`.
    pub fn ingredients(&self, product: ItemIdx) -> impl Iterator<Item = (ItemIdx, u32)> + '_ {
        let row = &self.counts[product.0 * self.n..(product.0 + 1) * self.n];
        row.iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(j, c)| (ItemIdx(j), *c))
    }

    /// Whether `product` can be decomposed into anything.
    pub fn has_recipe(&self, product: ItemIdx) -> bool {
        self.ingredients(product).next().is_some()
    }

    /// `Rᵗ · x` thresholded to a 0/1 mask: every immediate ingredient of any set item.
    pub fn ingredient_mask(&self, x: &ItemMask) -> ItemMask {
        debug_assert_eq!(x.len(), self.n);
        let mut out = ItemMask::zeros(self.n);
        for product in x.items() {
            for (ingredient, _) in self.ingredients(product) {
                out.insert(ingredient);
            }
        }
        out
    }
}

/// Cosine distance `1 - u·v / (|u||v|)`.
///
/// A zero-norm vector is infinitely distant from everything, so it never falls inside any
/// threshold.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return f64::INFINITY;
    }
    1.0 - dot / (na.sqrt() * nb.sqrt())
}

/// Row `i` = feature vector of item `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    dim: usize,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Build from one resolved vector per item, in item order.
    ///
    /// `None` rows surface as [`CatalogError::MissingEmbedding`]; rows of the wrong length as
    /// [`CatalogError::DimensionMismatch`].
    pub fn from_rows(
        items: &ItemSet,
        rows: impl IntoIterator<Item = Option<Vec<f64>>>,
    ) -> Result<Self, CatalogError> {
        let mut out = Vec::with_capacity(items.len());
        let mut dim = None;
        for ((_, name), row) in items.iter().zip(rows) {
            let row = row
                .filter(|r| !r.is_empty())
                .ok_or_else(|| CatalogError::MissingEmbedding {
                    item: name.to_string(),
                })?;
            let expected = *dim.get_or_insert(row.len());
            if row.len() != expected {
                return Err(CatalogError::DimensionMismatch {
                    item: name.to_string(),
                    expected,
                    found: row.len(),
                });
            }
            out.push(row);
        }
        if out.len() != items.len() {
            let missing = items.name(ItemIdx(out.len()));
            return Err(CatalogError::MissingEmbedding {
                item: missing.to_string(),
            });
        }
        Ok(Self {
            dim: dim.unwrap_or(0),
            rows: out,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn n_items(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, item: ItemIdx) -> &[f64] {
        &self.rows[item.0]
    }

    /// Symmetric pairwise cosine distances, rounded to 3 decimals.
    pub fn cosine_distances(&self) -> DistanceMatrix {
        let n = self.rows.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = round3(cosine_distance(&self.rows[i], &self.rows[j]));
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }
        DistanceMatrix { n, values }
    }
}

fn round3(x: f64) -> f64 {
    if x.is_finite() {
        (x * 1000.0).round() / 1000.0
    } else {
        x
    }
}

/// Symmetric item-to-item distance table. The diagonal is never consulted for thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn n_items(&self) -> usize {
        self.n
    }

    pub fn get(&self, a: ItemIdx, b: ItemIdx) -> f64 {
        self.values[a.0 * self.n + b.0]
    }

    /// Whether `b` is within `threshold` of `a`. An item is always within reach of itself.
    pub fn within(&self, a: ItemIdx, b: ItemIdx, threshold: f64) -> bool {
        a == b || self.get(a, b) <= threshold
    }
}

/// `L[i][k] = 1` iff item `i` is believed to be at location `k` (sentinel column included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationMatrix {
    n_locs: usize,
    cells: Vec<bool>,
}

impl LocationMatrix {
    pub fn build(belief: &Belief, locations: &LocationSet) -> Self {
        let n_locs = locations.len();
        let mut cells = vec![false; belief.len() * n_locs];
        for (item, locs) in belief.iter() {
            for loc in locs {
                assert!(
                    locations.contains(*loc),
                    "belief references location index {} outside the location set",
                    loc.0
                );
                cells[item.0 * n_locs + loc.0] = true;
            }
        }
        Self { n_locs, cells }
    }

    pub fn n_items(&self) -> usize {
        if self.n_locs == 0 {
            0
        } else {
            self.cells.len() / self.n_locs
        }
    }

    pub fn n_locations(&self) -> usize {
        self.n_locs
    }

    pub fn get(&self, item: ItemIdx, loc: LocIdx) -> bool {
        self.cells[item.0 * self.n_locs + loc.0]
    }

    /// `Lᵗ` applied to a single-item indicator: candidate locations of `item`.
    pub fn locations_of(&self, item: ItemIdx) -> impl Iterator<Item = LocIdx> + '_ {
        let row = &self.cells[item.0 * self.n_locs..(item.0 + 1) * self.n_locs];
        row.iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(|(k, _)| LocIdx(k))
    }

    /// Items believed at `loc`, in item order.
    pub fn items_at(&self, loc: LocIdx) -> impl Iterator<Item = ItemIdx> + '_ {
        (0..self.n_items())
            .filter(move |i| self.cells[i * self.n_locs + loc.0])
            .map(ItemIdx)
    }
}
