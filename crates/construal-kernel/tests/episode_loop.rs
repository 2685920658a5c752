use construal_core::Plan;
use construal_kernel::{
    run_episode, Actuator, ActuatorKind, ActuatorReport, Catalog, CatalogDocument,
    DocumentCatalog, EngineContext, EpisodeError, EpisodeParams, EpisodeState, Outcome,
};
use construal_planner::{AbstractionMode, PlanError, PlannerConfig};

// bread needs wheat; salt is nowhere in the world. The shed's prior puts wheat in the agent's
// own hands, which it does not hold.
const CATALOG: &str = r#"
items:
  - { name: wheat, embedding: [1.0, 0.0, 0.0] }
  - { name: bread, recipe: [{ item: wheat, count: 2 }], embedding: [0.7, 0.7, 0.0] }
  - { name: apple, embedding: [0.0, 1.0, 0.0] }
  - { name: salt, embedding: [0.0, 0.0, 1.0] }
location_sets:
  - id: village
    locations: [farm, mill, orchard]
    belief: { wheat: [mill], apple: [farm, orchard], salt: [farm, mill, orchard] }
    placement: { wheat: [mill], apple: [orchard] }
  - id: shed
    locations: [barn]
    belief: { wheat: [self] }
    placement: { wheat: [barn] }
"#;

fn catalog() -> DocumentCatalog {
    let doc: CatalogDocument = serde_yaml::from_str(CATALOG).unwrap();
    DocumentCatalog::from_document(doc).unwrap()
}

fn params(target: &str, plans_per_replan: usize, max_runs: u32) -> EpisodeParams {
    EpisodeParams {
        episode_id: 11,
        target: target.into(),
        mode: AbstractionMode::Identity,
        location_set: "village".into(),
        plans_per_replan,
        seed: 5,
        max_runs,
        stop_on_convergence: true,
    }
}

fn run(params: &EpisodeParams) -> Result<construal_kernel::EpisodeRecord, EpisodeError> {
    let catalog = catalog();
    let ctx = EngineContext::build(&catalog, &params.location_set)?;
    let mut actuator = ActuatorKind::Simulated.create(&catalog as &dyn Catalog, &ctx)?;
    run_episode(&ctx, &PlannerConfig::default(), params, actuator.as_mut())
}

#[test]
fn known_location_succeeds_in_one_run() {
    let record = run(&params("wheat", 1, 20)).unwrap();
    assert_eq!(record.outcome, 1);
    assert_eq!(record.run_count, 1);
    assert_eq!(record.replan_count, 1);
    assert_eq!(record.no_plan_count, 0);
    assert_eq!(record.final_plan.len(), 1);
    assert_eq!(record.final_plan[0].location, "mill");
    assert_eq!(record.final_plan[0].items, vec!["wheat".to_string()]);
    assert_eq!(record.episode_id, 11);
}

#[test]
fn unknown_product_is_searched_through_its_recipe() {
    let record = run(&params("bread", 1, 20)).unwrap();
    assert_eq!(record.outcome, 1);
    assert_eq!(record.final_plan[0].location, "mill");
    assert_eq!(record.final_plan[0].items, vec!["wheat".to_string()]);
}

#[test]
fn failed_search_is_revised_away() {
    // apple is believed at farm and orchard but only lives in the orchard.
    let record = run(&params("apple", 1, 20)).unwrap();
    assert_eq!(record.outcome, 1);
    assert!(record.run_count <= 2);
    assert_eq!(record.replan_count, record.run_count);
    assert_eq!(record.final_plan[0].location, "orchard");
}

#[test]
fn several_plans_per_replan_run_in_one_cycle() {
    let record = run(&params("apple", 3, 20)).unwrap();
    assert_eq!(record.outcome, 1);
    assert_eq!(record.replan_count, 1);
    assert!(record.run_count <= 2);
}

#[test]
fn run_budget_is_checked_after_every_plan() {
    let record = run(&params("salt", 3, 2)).unwrap();
    assert_eq!(record.outcome, -1);
    assert_eq!(record.run_count, 2);
    assert_eq!(record.replan_count, 1);
}

#[test]
fn budget_exhaustion_fails_the_episode() {
    let record = run(&params("salt", 1, 6)).unwrap();
    assert_eq!(record.outcome, -1);
    assert_eq!(record.run_count, 6);
    // three believed locations are refuted before the fallback takes over
    assert_eq!(record.no_plan_count, 3);
    assert!(record.observation_count > 0);
}

#[test]
fn unknown_target_is_fatal() {
    let err = run(&params("cake", 1, 20)).unwrap_err();
    assert!(matches!(
        err,
        EpisodeError::Plan(PlanError::UnknownTarget(ref t)) if t == "cake"
    ));
}

#[test]
fn unknown_location_set_is_not_found() {
    let mut p = params("wheat", 1, 20);
    p.location_set = "city".into();
    match run(&p).unwrap_err() {
        EpisodeError::Catalog(e) => assert!(e.is_not_found()),
        other => panic!("unexpected error: {other}"),
    }
}

/// Hands over the target on every run but never reports success.
struct Grudging;

impl Actuator for Grudging {
    fn execute(
        &mut self,
        _plan: &Plan,
        state: &EpisodeState,
    ) -> Result<ActuatorReport, EpisodeError> {
        let mut report = ActuatorReport::new(state.belief.len(), Outcome::Failure);
        report.acquired.push(state.target);
        Ok(report)
    }
}

fn run_grudging(params: &EpisodeParams) -> construal_kernel::EpisodeRecord {
    let catalog = catalog();
    let ctx = EngineContext::build(&catalog, &params.location_set).unwrap();
    run_episode(&ctx, &PlannerConfig::default(), params, &mut Grudging).unwrap()
}

#[test]
fn converged_plan_ends_the_episode() {
    let record = run_grudging(&params("wheat", 1, 20));
    assert_eq!(record.replan_count, 2);
    assert_eq!(record.run_count, 2);
    assert_eq!(record.outcome, -1);
    // the converged plan has nothing left to visit
    assert!(record.final_plan.is_empty());
}

#[test]
fn convergence_is_ignored_when_disabled() {
    let mut p = params("wheat", 1, 5);
    p.stop_on_convergence = false;
    let record = run_grudging(&p);
    assert_eq!(record.run_count, 5);
    assert_eq!(record.replan_count, 5);
    assert_eq!(record.outcome, -1);
}

#[test]
fn prior_at_own_position_is_still_searched() {
    let mut p = params("wheat", 1, 20);
    p.location_set = "shed".into();
    let record = run(&p).unwrap();
    assert_eq!(record.outcome, 1);
    assert_eq!(record.no_plan_count, 1);
    assert_eq!(record.run_count, 1);
    assert!(record.actuator_time >= 1.0);
    assert_eq!(record.final_plan[0].location, "barn");
}
