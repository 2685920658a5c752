//! Abstraction reasoner: generalizes the belief from related items before planning.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use construal_core::{
    cosine_distance, Belief, DistanceMatrix, FeatureMatrix, ItemIdx, LocIdx, LocationMatrix,
    LocationSet,
};
use serde::{Deserialize, Serialize};

use crate::PlanError;

/// How the belief is abstracted before search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbstractionMode {
    /// Precomputed knowledge-graph location tables, one per level.
    Scaling,
    /// Union of the beliefs of all items within a cosine-distance threshold.
    Similarity,
    /// Online per-location centroids; items near a centroid inherit its location.
    Clustering,
    /// No abstraction.
    #[serde(alias = "none")]
    Identity,
}

/// One rung of a mode's abstraction ladder.
///
/// `index` addresses scaling tables; `value` is the similarity/clustering threshold and doubles
/// as the `mod` penalty of every plan produced from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub index: usize,
    pub value: f64,
}

const THRESHOLD_LADDER: [f64; 3] = [0.0, 0.8, 1.0];

impl AbstractionMode {
    pub const ALL: [AbstractionMode; 4] = [
        AbstractionMode::Scaling,
        AbstractionMode::Similarity,
        AbstractionMode::Clustering,
        AbstractionMode::Identity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Scaling => "scaling",
            Self::Similarity => "similarity",
            Self::Clustering => "clustering",
            Self::Identity => "identity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "scaling" => Some(Self::Scaling),
            "similarity" => Some(Self::Similarity),
            "clustering" => Some(Self::Clustering),
            "identity" | "none" => Some(Self::Identity),
            _ => None,
        }
    }

    /// The three levels swept per replanning cycle, least abstract first.
    pub fn levels(self) -> [Level; 3] {
        match self {
            Self::Scaling => [0, 1, 2].map(|index| Level {
                index,
                value: index as f64,
            }),
            _ => {
                let mut out = [Level {
                    index: 0,
                    value: 0.0,
                }; 3];
                for (index, value) in THRESHOLD_LADDER.into_iter().enumerate() {
                    out[index] = Level { index, value };
                }
                out
            }
        }
    }
}

impl fmt::Display for AbstractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AbstractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown abstraction mode: {s}"))
    }
}

/// Externally supplied scaling beliefs, keyed by level index. Treated as an opaque lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalingTables {
    levels: BTreeMap<usize, Belief>,
}

impl ScalingTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, level: usize, belief: Belief) {
        self.levels.insert(level, belief);
    }

    pub fn get(&self, level: usize) -> Option<&Belief> {
        self.levels.get(&level)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Proposes an augmented belief for a given mode and level.
#[derive(Debug, Clone, Copy)]
pub struct Reasoner<'a> {
    features: &'a FeatureMatrix,
    distances: &'a DistanceMatrix,
    locations: &'a LocationSet,
    scaling: &'a ScalingTables,
}

impl<'a> Reasoner<'a> {
    pub fn new(
        features: &'a FeatureMatrix,
        distances: &'a DistanceMatrix,
        locations: &'a LocationSet,
        scaling: &'a ScalingTables,
    ) -> Self {
        Self {
            features,
            distances,
            locations,
            scaling,
        }
    }

    pub fn reason(
        &self,
        belief: &Belief,
        mode: AbstractionMode,
        level: Level,
    ) -> Result<Belief, PlanError> {
        match mode {
            AbstractionMode::Scaling => self
                .scaling
                .get(level.index)
                .cloned()
                .ok_or(PlanError::ScalingTableMissing { level: level.index }),
            AbstractionMode::Similarity => Ok(self.similar(belief, level.value)),
            AbstractionMode::Clustering => Ok(self.cluster(belief, level.value)),
            AbstractionMode::Identity => Ok(belief.clone()),
        }
    }

    /// Each item inherits the beliefs of every item within `threshold` of it (itself included).
    /// A zero threshold disables the abstraction.
    fn similar(&self, belief: &Belief, threshold: f64) -> Belief {
        if threshold <= 0.0 {
            return belief.clone();
        }
        let n = belief.len();
        let mut out = Belief::empty(n);
        for i in (0..n).map(ItemIdx) {
            for j in (0..n).map(ItemIdx) {
                if self.distances.within(i, j, threshold) {
                    out.extend(i, belief.locations(j).iter().copied());
                }
            }
        }
        out
    }

    /// An item is believed at every location owning a centroid within `threshold` of it.
    fn cluster(&self, belief: &Belief, threshold: f64) -> Belief {
        let matrix = LocationMatrix::build(belief, self.locations);
        let centroids = location_centroids(&matrix, self.features, threshold);
        let mut out = Belief::empty(belief.len());
        for item in (0..belief.len()).map(ItemIdx) {
            let x = self.features.row(item);
            for (k, cents) in centroids.iter().enumerate() {
                if cents
                    .iter()
                    .any(|c| cosine_distance(x, &c.mean) <= threshold)
                {
                    out.insert(item, LocIdx(k));
                }
            }
        }
        out
    }
}

/// Running-mean centroid of the feature vectors merged into it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Centroid {
    pub(crate) mean: Vec<f64>,
    pub(crate) members: usize,
}

impl Centroid {
    fn seed(x: &[f64]) -> Self {
        Self {
            mean: x.to_vec(),
            members: 1,
        }
    }

    fn absorb(&mut self, x: &[f64]) {
        let n = self.members as f64;
        for (m, v) in self.mean.iter_mut().zip(x) {
            *m = (n * *m + v) / (n + 1.0);
        }
        self.members += 1;
    }
}

/// Single-pass online clustering of the items believed at each location.
///
/// Items are visited in item order; each one merges into the nearest centroid strictly closer
/// than `threshold`, or seeds a new centroid.
pub(crate) fn location_centroids(
    matrix: &LocationMatrix,
    features: &FeatureMatrix,
    threshold: f64,
) -> Vec<Vec<Centroid>> {
    (0..matrix.n_locations())
        .map(|k| {
            let mut centroids: Vec<Centroid> = Vec::new();
            for item in matrix.items_at(LocIdx(k)) {
                let x = features.row(item);
                let nearest = centroids
                    .iter()
                    .enumerate()
                    .map(|(c, centroid)| (c, cosine_distance(x, &centroid.mean)))
                    .filter(|(_, d)| *d < threshold)
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                match nearest {
                    Some((c, _)) => centroids[c].absorb(x),
                    None => centroids.push(Centroid::seed(x)),
                }
            }
            centroids
        })
        .collect()
}
