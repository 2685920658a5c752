//! Construal CLI - plan, run and sweep search episodes.
//!
//! Single binary that provides:
//! - `construal init` - scaffold a project with a sample catalog
//! - `construal plan` - one replanning cycle from the prior belief
//! - `construal episode` - one episode against the simulated world
//! - `construal run` - the configured sweep
//! - `construal status` - fast status check

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use construal_core::PlanSet;
use construal_kernel::{
    observability::EventEmitter, run_episode, run_sweep, ActuatorKind, Catalog, DocumentCatalog,
    EngineContext, EpisodeParams, ExperimentConfig, JsonlResultSink, Sweep,
};
use construal_planner::{AbstractionMode, CycleInputs};

#[derive(Parser)]
#[command(name = "construal")]
#[command(about = "Construal planning engine", version)]
struct Cli {
    /// Project root directory
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project
    Init,

    /// Rank plans for a target from the prior belief
    Plan {
        #[arg(long)]
        target: String,

        #[arg(long, default_value = "identity")]
        mode: AbstractionMode,

        /// Location set id (first in the catalog if omitted)
        #[arg(long)]
        set: Option<String>,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Show at most this many plans
        #[arg(long)]
        top: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run a single episode and print its record
    Episode {
        #[arg(long)]
        target: String,

        #[arg(long, default_value = "identity")]
        mode: AbstractionMode,

        #[arg(long)]
        set: Option<String>,

        #[arg(long, default_value_t = 1)]
        plans_per_replan: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Run the configured sweep
    Run {
        /// Override max_parallel
        #[arg(long)]
        parallel: Option<usize>,

        /// Only print the expanded sweep
        #[arg(long)]
        dry_run: bool,
    },

    /// Show project status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let project_root = match cli.project {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Some(Commands::Init) => init_project(&project_root),
        Some(Commands::Plan {
            target,
            mode,
            set,
            seed,
            top,
            json,
        }) => show_plans(&project_root, &target, mode, set, seed, top, json),
        Some(Commands::Episode {
            target,
            mode,
            set,
            plans_per_replan,
            seed,
        }) => run_single(&project_root, target, mode, set, plans_per_replan, seed),
        Some(Commands::Run { parallel, dry_run }) => {
            run_experiment(&project_root, parallel, dry_run).await
        }
        Some(Commands::Status) => show_status(&project_root),
        None => {
            println!("Construal - search planning under partial knowledge");
            println!();
            println!("Usage: construal <COMMAND>");
            println!();
            println!("Commands:");
            println!("  init     Initialize a new project");
            println!("  plan     Rank plans for a target");
            println!("  episode  Run a single episode");
            println!("  run      Run the configured sweep");
            println!("  status   Show project status");
            println!();
            println!("Run 'construal --help' for more information.");
            Ok(())
        }
    }
}

fn load(project_root: &Path) -> Result<(ExperimentConfig, DocumentCatalog)> {
    let mut config = ExperimentConfig::load_from_project(project_root)?;
    config.resolve_paths(project_root);
    let catalog = DocumentCatalog::load(&config.catalog)?;
    Ok((config, catalog))
}

fn pick_set(catalog: &DocumentCatalog, set: Option<String>) -> Result<String> {
    match set {
        Some(set) => Ok(set),
        None => catalog
            .location_sets()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("catalog has no location sets")),
    }
}

fn show_plans(
    project_root: &Path,
    target: &str,
    mode: AbstractionMode,
    set: Option<String>,
    seed: u64,
    top: Option<usize>,
    json: bool,
) -> Result<()> {
    let (config, catalog) = load(project_root)?;
    let set = pick_set(&catalog, set)?;
    let context = EngineContext::build(&catalog, &set)?;
    let target_idx = context.resolve_target(target)?;
    let observations = construal_core::ObservationLog::new(context.items.len());
    let possession = construal_core::Possession::new(context.items.len());

    let mut plans: PlanSet = context.planner(&config.planner).plan_cycle(&CycleInputs {
        belief: &context.initial_belief,
        observations: &observations,
        possession: &possession,
        target: target_idx,
        mode,
        seed,
    })?;
    if let Some(n) = top {
        plans.truncate(n);
    }

    let named: Vec<_> = plans
        .iter()
        .map(|p| p.to_named(&context.items, &context.locations))
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&named)?);
        return Ok(());
    }

    println!("{} plans for {} ({} / {})", named.len(), target, mode, set);
    for (i, plan) in named.iter().enumerate() {
        let visits: Vec<String> = plan
            .visits()
            .map(|row| format!("{}: {}", row.location, row.items.join(", ")))
            .collect();
        println!(
            "  P{} score {:.3} (make {}, loc {}, mod {}) {}",
            i,
            plan.score,
            plan.penalty_make,
            plan.penalty_loc,
            plan.penalty_mod,
            visits.join(" | ")
        );
    }
    Ok(())
}

fn run_single(
    project_root: &Path,
    target: String,
    mode: AbstractionMode,
    set: Option<String>,
    plans_per_replan: usize,
    seed: u64,
) -> Result<()> {
    let (config, catalog) = load(project_root)?;
    let set = pick_set(&catalog, set)?;
    let context = EngineContext::build(&catalog, &set)?;
    let kind = ActuatorKind::from_name(&config.actuator)
        .ok_or_else(|| anyhow!("unknown actuator: {}", config.actuator))?;
    let mut actuator = kind.create(&catalog, &context)?;

    let params = EpisodeParams {
        episode_id: 0,
        target,
        mode,
        location_set: set,
        plans_per_replan,
        seed,
        max_runs: config.max_runs,
        stop_on_convergence: config.stop_on_convergence,
    };
    let record = run_episode(&context, &config.planner, &params, actuator.as_mut())?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn run_experiment(
    project_root: &Path,
    parallel: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    tracing::info!(project = %project_root.display(), "Starting sweep");

    let (mut config, catalog) = load(project_root)?;
    if let Some(parallel) = parallel {
        config.max_parallel = parallel;
    }
    let kind = ActuatorKind::from_name(&config.actuator)
        .ok_or_else(|| anyhow!("unknown actuator: {}", config.actuator))?;

    let sweep = Sweep::expand(&config, &catalog)?;
    tracing::info!(summary = %sweep.summary(), "Sweep expanded");
    if dry_run {
        for params in &sweep.episodes {
            println!(
                "{:>5} {} {} {} ppr={} seed={}",
                params.episode_id,
                params.target,
                params.mode,
                params.location_set,
                params.plans_per_replan,
                params.seed
            );
        }
        return Ok(());
    }

    let catalog: Arc<dyn Catalog> = Arc::new(catalog);
    let sink = JsonlResultSink::new(config.results_path());
    let events = EventEmitter::new(&config.output_dir);
    let summary = run_sweep(&config, catalog, sweep, kind, Box::new(sink), Some(events)).await?;

    println!("{}", summary.summary());
    for (episode_id, error) in &summary.errors {
        println!("  episode {episode_id}: {error}");
    }
    Ok(())
}

fn show_status(project_root: &Path) -> Result<()> {
    let mut config = ExperimentConfig::load_from_project(project_root)?;
    config.resolve_paths(project_root);

    let records = JsonlResultSink::new(config.results_path()).read_all()?;
    let successes = records.iter().filter(|r| r.is_success()).count();
    let recent_events = EventEmitter::new(&config.output_dir).read_recent(5);

    println!("Construal Status");
    println!("================");
    println!();
    println!("Project: {}", project_root.display());
    println!("Catalog: {}", config.catalog.display());
    println!();
    println!("Episodes recorded: {} ({} succeeded)", records.len(), successes);
    println!();
    println!("Recent events:");
    for event in &recent_events {
        println!(
            "  {} [{}] {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.event_type,
            event.message
        );
    }

    Ok(())
}

fn init_project(project_root: &Path) -> Result<()> {
    let construal_dir = project_root.join(".construal");
    std::fs::create_dir_all(&construal_dir)?;

    // Create default config
    let config_path = construal_dir.join("config.yaml");
    if !config_path.exists() {
        let default_config = r#"# Construal Configuration

catalog: catalog.yaml
output_dir: .construal/runs
max_parallel: 2
max_runs: 20
stop_on_convergence: true
actuator: simulated

sweep:
  targets: [bread]
  modes: [scaling, similarity, clustering, identity]
  location_sets: []
  plans_per_replan: [1, 3]
  seeds_per_condition: 5

planner:
  weights:
    max_make: 4.0
    loc_scale: 18.0
    mod_scale: 3.0
  max_combinations: 4096
"#;
        std::fs::write(&config_path, default_config)?;
    }

    // Create sample catalog
    let catalog_path = project_root.join("catalog.yaml");
    if !catalog_path.exists() {
        let sample_catalog = r#"items:
  - name: wheat
    embedding: [0.9, 0.1, 0.0, 0.0]
  - name: flour
    recipe: [{ item: wheat, count: 2 }]
    embedding: [0.8, 0.3, 0.1, 0.0]
  - name: bread
    recipe: [{ item: flour, count: 1 }]
    embedding: [0.7, 0.5, 0.1, 0.0]
  - name: apple
    embedding: [0.1, 0.9, 0.0, 0.1]
  - name: fish
    embedding: [0.0, 0.1, 0.9, 0.2]

location_sets:
  - id: village
    locations: [farm, mill, bakery, orchard, lake]
    belief:
      wheat: [farm]
      apple: [orchard]
    scaling:
      0: { wheat: [farm], apple: [orchard] }
      1: { wheat: [farm], apple: [orchard, farm], fish: [lake] }
      2: { wheat: [farm, mill], flour: [mill], apple: [orchard, farm], fish: [lake] }
    placement:
      wheat: [farm]
      flour: [mill]
      bread: [bakery]
      apple: [orchard]
      fish: [lake]
"#;
        std::fs::write(&catalog_path, sample_catalog)?;
    }

    println!("Initialized Construal project at {}", project_root.display());
    println!();
    println!("Created:");
    println!("  .construal/config.yaml - experiment configuration");
    println!("  catalog.yaml           - items, recipes and location sets");
    println!();
    println!("Next steps:");
    println!("  1. Run: construal plan --target bread --mode similarity");
    println!("  2. Run: construal run");

    Ok(())
}
