//! Catalog provider: items, recipes, location sets, embeddings and prior beliefs.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use construal_core::CatalogError;
use serde::{Deserialize, Serialize};

/// Most ingredients a single recipe may list.
pub const MAX_INGREDIENTS: usize = 5;

/// Item name -> location names.
pub type Placement = BTreeMap<String, Vec<String>>;

/// Read-only reference data an episode is built from.
///
/// Unresolvable ids fail with [`CatalogError::NotFound`]; nothing is defaulted.
pub trait Catalog: Send + Sync {
    /// Every item, in catalog order.
    fn items(&self) -> Vec<String>;

    /// `(ingredient, count)` pairs needed to make `item`. Empty for raw items.
    fn recipe(&self, item: &str) -> Result<Vec<(String, u32)>, CatalogError>;

    /// Ids of every location set.
    fn location_sets(&self) -> Vec<String>;

    /// Ordered named locations of a set.
    fn locations(&self, set: &str) -> Result<Vec<String>, CatalogError>;

    fn embedding(&self, item: &str) -> Result<Vec<f64>, CatalogError>;

    /// Belief an episode starts from.
    fn initial_belief(&self, set: &str) -> Result<Placement, CatalogError>;

    /// Precomputed scaling-mode belief for one abstraction level.
    fn abstraction_table(&self, set: &str, level: usize) -> Result<Placement, CatalogError>;

    /// Where items really are. Only simulated actuators need this.
    fn ground_truth(&self, set: &str) -> Result<Placement, CatalogError> {
        Err(CatalogError::not_found("ground truth", set))
    }
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub items: Vec<ItemEntry>,
    #[serde(default)]
    pub location_sets: Vec<LocationSetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEntry {
    pub name: String,
    #[serde(default)]
    pub recipe: Vec<Ingredient>,
    #[serde(default)]
    pub embedding: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSetEntry {
    pub id: String,
    pub locations: Vec<String>,
    /// Prior belief
    #[serde(default)]
    pub belief: Placement,
    /// Scaling tables keyed by level
    #[serde(default)]
    pub scaling: BTreeMap<usize, Placement>,
    /// Where items really are; read by the simulated actuator only
    #[serde(default)]
    pub placement: Placement,
}

/// [`Catalog`] backed by one YAML or JSON document.
#[derive(Debug, Clone)]
pub struct DocumentCatalog {
    document: CatalogDocument,
    items: HashMap<String, usize>,
    sets: HashMap<String, usize>,
}

impl DocumentCatalog {
    /// Load a catalog document. `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {}", path.display()))?;
        let document: CatalogDocument = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse catalog from {}", path.display()))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse catalog from {}", path.display()))?,
        };
        Self::from_document(document)
            .with_context(|| format!("Invalid catalog {}", path.display()))
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut items = HashMap::with_capacity(document.items.len());
        for (i, entry) in document.items.iter().enumerate() {
            if items.insert(entry.name.clone(), i).is_some() {
                return Err(CatalogError::Invalid(format!(
                    "duplicate item {}",
                    entry.name
                )));
            }
            if entry.recipe.len() > MAX_INGREDIENTS {
                return Err(CatalogError::Invalid(format!(
                    "recipe for {} lists {} ingredients (max {MAX_INGREDIENTS})",
                    entry.name,
                    entry.recipe.len()
                )));
            }
        }
        let mut sets = HashMap::with_capacity(document.location_sets.len());
        for (i, entry) in document.location_sets.iter().enumerate() {
            if sets.insert(entry.id.clone(), i).is_some() {
                return Err(CatalogError::Invalid(format!(
                    "duplicate location set {}",
                    entry.id
                )));
            }
        }
        Ok(Self {
            document,
            items,
            sets,
        })
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    fn item(&self, name: &str) -> Result<&ItemEntry, CatalogError> {
        self.items
            .get(name)
            .map(|i| &self.document.items[*i])
            .ok_or_else(|| CatalogError::not_found("item", name))
    }

    fn set(&self, id: &str) -> Result<&LocationSetEntry, CatalogError> {
        self.sets
            .get(id)
            .map(|i| &self.document.location_sets[*i])
            .ok_or_else(|| CatalogError::not_found("location set", id))
    }
}

impl Catalog for DocumentCatalog {
    fn items(&self) -> Vec<String> {
        self.document.items.iter().map(|e| e.name.clone()).collect()
    }

    fn recipe(&self, item: &str) -> Result<Vec<(String, u32)>, CatalogError> {
        Ok(self
            .item(item)?
            .recipe
            .iter()
            .map(|i| (i.item.clone(), i.count))
            .collect())
    }

    fn location_sets(&self) -> Vec<String> {
        self.document
            .location_sets
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    fn locations(&self, set: &str) -> Result<Vec<String>, CatalogError> {
        Ok(self.set(set)?.locations.clone())
    }

    fn embedding(&self, item: &str) -> Result<Vec<f64>, CatalogError> {
        let entry = self.item(item)?;
        if entry.embedding.is_empty() {
            return Err(CatalogError::MissingEmbedding {
                item: item.to_string(),
            });
        }
        Ok(entry.embedding.clone())
    }

    fn initial_belief(&self, set: &str) -> Result<Placement, CatalogError> {
        Ok(self.set(set)?.belief.clone())
    }

    fn abstraction_table(&self, set: &str, level: usize) -> Result<Placement, CatalogError> {
        self.set(set)?
            .scaling
            .get(&level)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("scaling table", format!("{set}/{level}")))
    }

    fn ground_truth(&self, set: &str) -> Result<Placement, CatalogError> {
        Ok(self.set(set)?.placement.clone())
    }
}
