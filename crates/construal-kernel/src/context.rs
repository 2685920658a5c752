//! Engine context: catalog data resolved into matrices once per location set.

use construal_core::{
    Belief, CatalogError, DistanceMatrix, FeatureMatrix, ItemIdx, ItemSet, LocationSet,
    RecipeMatrix,
};
use construal_planner::{
    AbstractionMode, PlanError, PlanSearch, Planner, PlannerConfig, Reasoner, ScalingTables,
};
use tracing::debug;

use crate::catalog::{Catalog, Placement};

/// Everything an episode reads, shared read-only between the episodes of one location set.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub set_id: String,
    pub items: ItemSet,
    pub locations: LocationSet,
    pub recipes: RecipeMatrix,
    pub features: FeatureMatrix,
    pub distances: DistanceMatrix,
    pub initial_belief: Belief,
    pub scaling: ScalingTables,
}

impl EngineContext {
    pub fn build(catalog: &dyn Catalog, set: &str) -> Result<Self, CatalogError> {
        let items = ItemSet::new(catalog.items());
        let locations = LocationSet::new(catalog.locations(set)?);

        let mut recipes = RecipeMatrix::new(items.len());
        for (product, name) in items.iter() {
            for (ingredient, count) in catalog.recipe(name)? {
                recipes.set(product, items.resolve(&ingredient)?, count);
            }
        }

        let rows = items
            .names()
            .iter()
            .map(|name| match catalog.embedding(name) {
                Ok(v) => Ok(Some(v)),
                Err(CatalogError::MissingEmbedding { .. }) => Ok(None),
                Err(e) => Err(e),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let features = FeatureMatrix::from_rows(&items, rows)?;
        let distances = features.cosine_distances();

        let initial_belief =
            belief_from_placement(&catalog.initial_belief(set)?, &items, &locations)?;

        let mut scaling = ScalingTables::new();
        for level in AbstractionMode::Scaling.levels() {
            match catalog.abstraction_table(set, level.index) {
                Ok(table) => scaling.insert(
                    level.index,
                    belief_from_placement(&table, &items, &locations)?,
                ),
                Err(e) if e.is_not_found() => {
                    debug!(set, level = level.index, "no scaling table");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Self {
            set_id: set.to_string(),
            items,
            locations,
            recipes,
            features,
            distances,
            initial_belief,
            scaling,
        })
    }

    pub fn planner<'a>(&'a self, config: &'a PlannerConfig) -> Planner<'a> {
        Planner::new(
            Reasoner::new(
                &self.features,
                &self.distances,
                &self.locations,
                &self.scaling,
            ),
            PlanSearch::new(&self.recipes, &self.locations, config),
        )
    }

    pub fn resolve_target(&self, name: &str) -> Result<ItemIdx, PlanError> {
        self.items
            .get(name)
            .ok_or_else(|| PlanError::UnknownTarget(name.to_string()))
    }
}

/// Resolve a name-keyed placement into a belief over `items`.
pub fn belief_from_placement(
    placement: &Placement,
    items: &ItemSet,
    locations: &LocationSet,
) -> Result<Belief, CatalogError> {
    let mut belief = Belief::empty(items.len());
    for (item, locs) in placement {
        let item = items.resolve(item)?;
        for loc in locs {
            belief.insert(item, locations.resolve(loc)?);
        }
    }
    Ok(belief)
}
