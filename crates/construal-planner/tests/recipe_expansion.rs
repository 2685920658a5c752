use construal_core::{
    Assignment, Belief, FeatureMatrix, ItemIdx, ItemMask, ItemSet, LocIdx, LocationSet,
    ObservationLog, Possession, RecipeMatrix,
};
use construal_planner::{
    substitute, AbstractionMode, CycleInputs, PlanSearch, Planner, PlannerConfig, Reasoner,
    ScalingTables, MAX_RECIPE_DEPTH,
};

struct World {
    items: ItemSet,
    locations: LocationSet,
    recipes: RecipeMatrix,
    features: FeatureMatrix,
}

// x = 0, y = 1; y needs one x.
fn two_item_world() -> World {
    let items = ItemSet::new(["x", "y"]);
    let locations = LocationSet::new(["A", "B", "C"]);
    let recipes = RecipeMatrix::from_edges(2, [(ItemIdx(1), ItemIdx(0), 1)]);
    let features =
        FeatureMatrix::from_rows(&items, [Some(vec![1.0, 0.0]), Some(vec![0.0, 1.0])]).unwrap();
    World {
        items,
        locations,
        recipes,
        features,
    }
}

#[test]
fn nothing_known_yields_no_plan() {
    let w = two_item_world();
    let config = PlannerConfig::default();
    let plans = PlanSearch::new(&w.recipes, &w.locations, &config).search(
        &Belief::empty(2),
        &Possession::new(2),
        ItemIdx(1),
        0.0,
    );
    assert!(plans.is_empty());
}

#[test]
fn unknown_product_falls_through_to_its_ingredient() {
    let w = two_item_world();
    let config = PlannerConfig::default();
    let mut belief = Belief::empty(2);
    belief.insert(ItemIdx(0), w.locations.get("B").unwrap());

    let plans = PlanSearch::new(&w.recipes, &w.locations, &config).search(
        &belief,
        &Possession::new(2),
        ItemIdx(1),
        0.0,
    );
    assert_eq!(plans.len(), 1);
    let named = plans.first().unwrap().to_named(&w.items, &w.locations);
    let visits: Vec<_> = named.visits().collect();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].location, "B");
    assert_eq!(visits[0].items, vec!["x".to_string()]);
    assert_eq!(named.penalty_make, 1);
    assert_eq!(named.score, 0.708);
}

#[test]
fn known_target_scores_just_under_one() {
    let w = two_item_world();
    let config = PlannerConfig::default();
    let mut belief = Belief::empty(2);
    belief.insert(ItemIdx(0), LocIdx(0));

    let plans = PlanSearch::new(&w.recipes, &w.locations, &config).search(
        &belief,
        &Possession::new(2),
        ItemIdx(0),
        0.0,
    );
    let plan = plans.first().unwrap();
    assert_eq!(plan.penalties().loc, 1);
    assert_eq!(plan.score(), 0.944);
    assert!(!plan.is_converged());
}

#[test]
fn possessed_items_move_to_the_sentinel_row() {
    let w = two_item_world();
    let config = PlannerConfig::default();
    let mut belief = Belief::empty(2);
    belief.insert(ItemIdx(0), LocIdx(2));
    let mut held = Possession::new(2);
    held.acquire(ItemIdx(0));

    let plans = PlanSearch::new(&w.recipes, &w.locations, &config).search(
        &belief,
        &held,
        ItemIdx(0),
        0.0,
    );
    let plan = plans.first().unwrap();
    assert!(plan.assignment().items_at(LocIdx(2)).is_empty());
    assert_eq!(
        plan.assignment().items_at(w.locations.sentinel()),
        &[ItemIdx(0)]
    );
    assert_eq!(plan.score(), 1.0);
}

#[test]
fn leftovers_survive_every_substitution() {
    // 0 <- 1 <- 2 chain plus an undecomposable 3
    let recipes =
        RecipeMatrix::from_edges(4, [(ItemIdx(0), ItemIdx(1), 1), (ItemIdx(1), ItemIdx(2), 1)]);
    let mut mask = ItemMask::single(4, ItemIdx(0));
    mask.insert(ItemIdx(3));
    for _ in 0..MAX_RECIPE_DEPTH {
        mask = substitute(&recipes, &mask);
        assert!(mask.contains(ItemIdx(3)));
    }
    assert!(mask.contains(ItemIdx(2)));
    assert_eq!(mask.count(), 2);
}

#[test]
fn deeper_levels_score_lower_across_a_cycle() {
    let w = two_item_world();
    let config = PlannerConfig::default();
    let distances = w.features.cosine_distances();
    let scaling = ScalingTables::new();
    let planner = Planner::new(
        Reasoner::new(&w.features, &distances, &w.locations, &scaling),
        PlanSearch::new(&w.recipes, &w.locations, &config),
    );
    let mut belief = Belief::empty(2);
    belief.insert(ItemIdx(0), LocIdx(1));

    let plans = planner
        .plan_cycle(&CycleInputs {
            belief: &belief,
            observations: &ObservationLog::new(2),
            possession: &Possession::new(2),
            target: ItemIdx(1),
            mode: AbstractionMode::Similarity,
            seed: 3,
        })
        .unwrap();

    // x and y are orthogonal, so only the top level (1.0) lets y borrow x's location.
    let mut direct = Assignment::empty(4);
    direct.assign(LocIdx(1), ItemIdx(1));
    let mut via_recipe = Assignment::empty(4);
    via_recipe.assign(LocIdx(1), ItemIdx(0));
    assert_eq!(plans.len(), 2);
    assert_eq!(plans.first().unwrap().assignment(), &via_recipe);
    assert_eq!(plans.get(1).unwrap().assignment(), &direct);
}
