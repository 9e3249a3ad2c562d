//! Process-lifetime module cache

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{LoadedModule, ModuleLocation, PluginLoader};
use crate::error::LoadError;

/// Loaded modules keyed by resolved location.
///
/// Only successful loads are cached, so a manifest that appears later is
/// still picked up.
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: Mutex<HashMap<ModuleLocation, Arc<LoadedModule>>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached module for `location`, loading it on a miss.
    ///
    /// The lock is held across the load so concurrent callers never load
    /// the same location twice.
    pub async fn get_or_load(
        &self,
        location: &ModuleLocation,
        loader: &dyn PluginLoader,
    ) -> Result<Arc<LoadedModule>, LoadError> {
        let mut modules = self.modules.lock().await;
        if let Some(module) = modules.get(location) {
            tracing::trace!(%location, "Module cache hit");
            return Ok(Arc::clone(module));
        }

        let module = Arc::new(loader.load(location).await?);
        tracing::debug!(%location, "Module loaded");
        modules.insert(location.clone(), Arc::clone(&module));
        Ok(module)
    }

    pub async fn contains(&self, location: &ModuleLocation) -> bool {
        self.modules.lock().await.contains_key(location)
    }

    pub async fn len(&self) -> usize {
        self.modules.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.modules.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.modules.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repo_meta::RepoCategory;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PluginLoader for CountingLoader {
        async fn load(&self, location: &ModuleLocation) -> Result<LoadedModule, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match location {
                ModuleLocation::Builtin(_) => Ok(LoadedModule::Static(Vec::new())),
                ModuleLocation::File(_) => Err(LoadError::NotFound {
                    location: location.clone(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_second_lookup_is_a_hit() {
        let cache = ModuleCache::new();
        let loader = CountingLoader::default();
        let location = ModuleLocation::Builtin(RepoCategory::Backend);

        cache.get_or_load(&location, &loader).await.unwrap();
        cache.get_or_load(&location, &loader).await.unwrap();

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&location).await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ModuleCache::new();
        let loader = CountingLoader::default();
        let location = ModuleLocation::File(PathBuf::from("/missing/tools.toml"));

        assert!(cache.get_or_load(&location, &loader).await.is_err());
        assert!(cache.get_or_load(&location, &loader).await.is_err());

        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
    }
}
