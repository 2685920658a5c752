//! Experiment configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use construal_planner::{AbstractionMode, PlannerConfig};
use serde::{Deserialize, Serialize};

/// Main experiment configuration, loaded from .construal/config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Config version
    pub version: Option<String>,

    /// Catalog document (relative to project root)
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,

    /// Directory for results.jsonl and events.jsonl
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum episodes running at once
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Actuator run budget per episode
    #[serde(default = "default_max_runs")]
    pub max_runs: u32,

    /// End an episode after a cycle whose top plan needs no visits
    #[serde(default = "default_true")]
    pub stop_on_convergence: bool,

    /// Episode actuator
    #[serde(default = "default_actuator")]
    pub actuator: String,

    /// Outer sweep over episode parameters
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Plan search and scoring
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// Conditions crossed by a sweep. One episode per combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Explicit target items; sampled from the catalog when empty
    #[serde(default)]
    pub targets: Vec<String>,

    /// Number of targets to sample when none are listed
    #[serde(default = "default_sample_targets")]
    pub sample_targets: usize,

    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,

    #[serde(default = "default_modes")]
    pub modes: Vec<AbstractionMode>,

    /// Location set ids; every set in the catalog when empty
    #[serde(default)]
    pub location_sets: Vec<String>,

    #[serde(default = "default_plans_per_replan")]
    pub plans_per_replan: Vec<usize>,

    /// Seeds `0..n` per condition
    #[serde(default = "default_seeds_per_condition")]
    pub seeds_per_condition: u64,
}

fn default_catalog() -> PathBuf {
    PathBuf::from("catalog.yaml")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".construal/runs")
}
fn default_max_parallel() -> usize {
    1
}
fn default_max_runs() -> u32 {
    20
}
fn default_true() -> bool {
    true
}
fn default_actuator() -> String {
    "simulated".to_string()
}
fn default_sample_targets() -> usize {
    10
}
fn default_sample_seed() -> u64 {
    1
}
fn default_modes() -> Vec<AbstractionMode> {
    AbstractionMode::ALL.to_vec()
}
fn default_plans_per_replan() -> Vec<usize> {
    vec![1, 3, 5]
}
fn default_seeds_per_condition() -> u64 {
    10
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            sample_targets: default_sample_targets(),
            sample_seed: default_sample_seed(),
            modes: default_modes(),
            location_sets: Vec::new(),
            plans_per_replan: default_plans_per_replan(),
            seeds_per_condition: default_seeds_per_condition(),
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            version: None,
            catalog: default_catalog(),
            output_dir: default_output_dir(),
            max_parallel: default_max_parallel(),
            max_runs: default_max_runs(),
            stop_on_convergence: true,
            actuator: default_actuator(),
            sweep: SweepConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from project root (looks for .construal/config.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".construal/config.yaml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve paths relative to project root
    pub fn resolve_paths(&mut self, project_root: &Path) {
        self.catalog = project_root.join(&self.catalog);
        self.output_dir = project_root.join(&self.output_dir);
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join("results.jsonl")
    }

    pub fn events_path(&self) -> PathBuf {
        self.output_dir.join("events.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config: ExperimentConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.max_runs, 20);
        assert_eq!(config.sweep.modes.len(), 4);
        assert_eq!(config.sweep.plans_per_replan, vec![1, 3, 5]);
        assert_eq!(config.planner.max_combinations, 4096);
        assert!(config.stop_on_convergence);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let yaml = r#"
max_parallel: 4
sweep:
  targets: [bread]
  modes: [similarity, none]
planner:
  weights:
    loc_scale: 10.0
"#;
        let config: ExperimentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_parallel, 4);
        assert_eq!(config.sweep.targets, vec!["bread".to_string()]);
        assert_eq!(
            config.sweep.modes,
            vec![AbstractionMode::Similarity, AbstractionMode::Identity]
        );
        assert_eq!(config.sweep.seeds_per_condition, 10);
        assert_eq!(config.planner.weights.loc_scale, 10.0);
        assert_eq!(config.planner.weights.max_make, 4.0);
    }

    #[test]
    fn missing_project_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ExperimentConfig::load_from_project(dir.path()).unwrap();
        config.resolve_paths(dir.path());
        assert_eq!(config.catalog, dir.path().join("catalog.yaml"));
        assert_eq!(
            config.results_path(),
            dir.path().join(".construal/runs/results.jsonl")
        );
    }
}
