use construal_core::ScoreWeights;
use serde::{Deserialize, Serialize};

/// Tuning knobs for plan search and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Normalisers of the make/loc/mod score factors.
    pub weights: ScoreWeights,

    /// Cap on location combinations expanded per recipe level. The cartesian product of
    /// per-item candidate locations grows quickly once abstraction widens the belief.
    pub max_combinations: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            max_combinations: 4096,
        }
    }
}
