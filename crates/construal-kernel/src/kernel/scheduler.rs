//! Scheduler - expands the sweep configuration into episodes.

use anyhow::{bail, Result};
use construal_core::{DeterministicRng, SplitMix64};

use crate::catalog::Catalog;
use crate::config::ExperimentConfig;
use crate::episode::EpisodeParams;

/// Every episode of a sweep, with contiguous ids.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    pub episodes: Vec<EpisodeParams>,
}

impl Sweep {
    /// One episode per (target, mode, location set, plans per replan, seed).
    ///
    /// Targets are sampled from the catalog with `sweep.sample_seed` when none are listed;
    /// location sets default to every set in the catalog.
    pub fn expand(config: &ExperimentConfig, catalog: &dyn Catalog) -> Result<Self> {
        let sweep = &config.sweep;
        let targets = if sweep.targets.is_empty() {
            sample_targets(catalog, sweep.sample_targets, sweep.sample_seed)
        } else {
            sweep.targets.clone()
        };
        let sets = if sweep.location_sets.is_empty() {
            catalog.location_sets()
        } else {
            sweep.location_sets.clone()
        };
        if targets.is_empty() || sets.is_empty() {
            bail!("sweep has no targets or no location sets");
        }

        let mut episodes = Vec::new();
        for target in &targets {
            for mode in &sweep.modes {
                for set in &sets {
                    for plans_per_replan in &sweep.plans_per_replan {
                        for seed in 0..sweep.seeds_per_condition {
                            episodes.push(EpisodeParams {
                                episode_id: episodes.len() as u64,
                                target: target.clone(),
                                mode: *mode,
                                location_set: set.clone(),
                                plans_per_replan: *plans_per_replan,
                                seed,
                                max_runs: config.max_runs,
                                stop_on_convergence: config.stop_on_convergence,
                            });
                        }
                    }
                }
            }
        }
        Ok(Self { episodes })
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Distinct location sets, in first-use order.
    pub fn location_sets(&self) -> Vec<String> {
        let mut sets: Vec<String> = Vec::new();
        for params in &self.episodes {
            if !sets.contains(&params.location_set) {
                sets.push(params.location_set.clone());
            }
        }
        sets
    }

    pub fn summary(&self) -> String {
        format!(
            "Episodes: {}, Location sets: {}",
            self.episodes.len(),
            self.location_sets().len()
        )
    }
}

/// `count` distinct catalog items drawn with a seeded generator.
pub fn sample_targets(catalog: &dyn Catalog, count: usize, seed: u64) -> Vec<String> {
    let items = catalog.items();
    SplitMix64::new(seed)
        .sample_indices(items.len(), count)
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}
