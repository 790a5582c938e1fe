//! External persistence contracts.
//!
//! Plans and fetched datasets are persisted by the caller; this module fixes
//! the narrow trait surface the core consumes and ships in-memory reference
//! implementations for tests and embedding.

use crate::error::{PlaceCoverError, Result};
use geojson::FeatureCollection;
use rustc_hash::FxHashMap;

/// Persisted search plans, keyed by plan name.
///
/// The store is the single source of truth for skip marks: rectification
/// reads, modifies, and writes back through it. Callers serialize rectify
/// calls per plan name.
pub trait PlanStore {
    /// Persist a plan under `name`, replacing any previous version.
    fn save_plan(&mut self, name: &str, plan: &[String]) -> Result<()>;

    /// Load a persisted plan. Fails with `PlanNotFound` when absent.
    fn get_plan(&self, name: &str) -> Result<Vec<String>>;
}

/// Fetched feature collections, keyed by dataset filename.
pub trait DatasetCache {
    fn get(&self, key: &str) -> Result<Option<FeatureCollection>>;

    fn put(&mut self, key: &str, collection: &FeatureCollection) -> Result<()>;
}

/// In-memory plan store.
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    plans: FxHashMap<String, Vec<String>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl PlanStore for MemoryPlanStore {
    fn save_plan(&mut self, name: &str, plan: &[String]) -> Result<()> {
        self.plans.insert(name.to_string(), plan.to_vec());
        Ok(())
    }

    fn get_plan(&self, name: &str) -> Result<Vec<String>> {
        self.plans
            .get(name)
            .cloned()
            .ok_or_else(|| PlaceCoverError::PlanNotFound(name.to_string()))
    }
}

/// In-memory dataset cache.
#[derive(Debug, Default)]
pub struct MemoryDatasetCache {
    datasets: FxHashMap<String, FeatureCollection>,
}

impl MemoryDatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl DatasetCache for MemoryDatasetCache {
    fn get(&self, key: &str) -> Result<Option<FeatureCollection>> {
        Ok(self.datasets.get(key).cloned())
    }

    fn put(&mut self, key: &str, collection: &FeatureCollection) -> Result<()> {
        self.datasets.insert(key.to_string(), collection.clone());
        Ok(())
    }
}
