//! Feature store contract.
//!
//! The domain layer owns persistence; the engine only needs enough of it to
//! apply and reverse edits. Geometries in the store are in the storage
//! projection.

use async_trait::async_trait;
use geoedit_core::{Feature, FeatureId, Geometry};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};

/// Persistence for edited features.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Stores a new feature. The feature must carry an identifier.
    async fn insert(&self, feature: Feature) -> StoreResult<()>;

    /// Removes a feature and returns it.
    async fn remove(&self, id: &FeatureId) -> StoreResult<Feature>;

    async fn get(&self, id: &FeatureId) -> StoreResult<Option<Feature>>;

    /// Replaces a feature's geometry and returns the previous one.
    async fn replace_geometry(&self, id: &FeatureId, geometry: Geometry) -> StoreResult<Geometry>;

    async fn list(&self) -> StoreResult<Vec<Feature>>;
}

/// In-memory feature store keyed by feature id.
#[derive(Debug, Default)]
pub struct InMemoryFeatureStore {
    features: RwLock<BTreeMap<FeatureId, Feature>>,
}

impl InMemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `features`. Anonymous features are skipped.
    pub fn with_features(features: impl IntoIterator<Item = Feature>) -> Self {
        let map = features
            .into_iter()
            .filter_map(|f| f.id.clone().map(|id| (id, f)))
            .collect();
        Self {
            features: RwLock::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.features.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.read().is_empty()
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.features.read().contains_key(id)
    }
}

#[async_trait]
impl FeatureStore for InMemoryFeatureStore {
    async fn insert(&self, feature: Feature) -> StoreResult<()> {
        let id = feature.id.clone().ok_or(StoreError::MissingId)?;
        let mut features = self.features.write();
        if features.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        features.insert(id, feature);
        Ok(())
    }

    async fn remove(&self, id: &FeatureId) -> StoreResult<Feature> {
        self.features
            .write()
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn get(&self, id: &FeatureId) -> StoreResult<Option<Feature>> {
        Ok(self.features.read().get(id).cloned())
    }

    async fn replace_geometry(&self, id: &FeatureId, geometry: Geometry) -> StoreResult<Geometry> {
        let mut features = self.features.write();
        let feature = features
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(std::mem::replace(&mut feature.geometry, geometry))
    }

    async fn list(&self) -> StoreResult<Vec<Feature>> {
        Ok(self.features.read().values().cloned().collect())
    }
}
