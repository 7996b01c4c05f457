//! Explicit cache of loaded models.
//!
//! The cache is an ordinary value owned by the caller; nothing is evicted
//! unless the caller removes it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::Model;
use crate::error::ModelError;

/// Identity of a cached model: its source file and the model it was loaded
/// on top of, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Source file.
    pub source: PathBuf,
    /// Source file of the parent model.
    pub parent: Option<PathBuf>,
}

impl CacheKey {
    /// Key for a model without parent.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            parent: None,
        }
    }

    /// Set the parent model's source.
    pub fn with_parent(mut self, parent: impl AsRef<Path>) -> Self {
        self.parent = Some(parent.as_ref().to_path_buf());
        self
    }
}

/// Thread-safe map from [`CacheKey`] to shared models.
#[derive(Debug, Default)]
pub struct ModelCache {
    entries: RwLock<HashMap<CacheKey, Arc<Model>>>,
}

impl ModelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached model for `key`.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Model>> {
        self.entries.read().get(key).cloned()
    }

    /// Store `model` under `key`, returning the model it replaced.
    pub fn insert(&self, key: CacheKey, model: Arc<Model>) -> Option<Arc<Model>> {
        self.entries.write().insert(key, model)
    }

    /// Cached model for `key`, loading it with `load` on a miss.
    ///
    /// The lock is not held while loading. If two threads miss at once, both
    /// load and the first one to finish wins.
    pub fn get_or_load<F>(&self, key: CacheKey, load: F) -> Result<Arc<Model>, ModelError>
    where
        F: FnOnce() -> Result<Model, ModelError>,
    {
        if let Some(model) = self.get(&key) {
            return Ok(model);
        }
        let model = Arc::new(load()?);
        Ok(self.entries.write().entry(key).or_insert(model).clone())
    }

    /// Drop the model cached for `key`.
    pub fn remove(&self, key: &CacheKey) -> Option<Arc<Model>> {
        self.entries.write().remove(key)
    }

    /// Drop every cached model.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached models.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn empty_model(name: &str) -> Model {
        Model::empty(name)
    }

    #[test]
    fn test_get_or_load_loads_once() {
        let cache = ModelCache::new();
        let loads = AtomicUsize::new(0);
        let key = CacheKey::new("a.mesh");
        for _ in 0..3 {
            let model = cache
                .get_or_load(key.clone(), || {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(empty_model("a"))
                })
                .unwrap();
            assert_eq!(model.name(), "a");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = ModelCache::new();
        let key = CacheKey::new("broken.mesh");
        let result = cache.get_or_load(key.clone(), || {
            Err(ModelError::FileTypeNotSupported("broken".into()))
        });
        assert!(result.is_err());
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_parent_is_part_of_identity() {
        let cache = ModelCache::new();
        let plain = CacheKey::new("item.mesh.ascii");
        let child = CacheKey::new("item.mesh.ascii").with_parent("hero.mesh");
        cache.insert(plain.clone(), Arc::new(empty_model("plain")));
        cache.insert(child.clone(), Arc::new(empty_model("child")));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&child).map(|m| m.name().to_string()), Some("child".into()));

        assert!(cache.remove(&plain).is_some());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
