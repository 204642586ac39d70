//! Metadata caching shared across resolutions.
//!
//! Each resolution already memoizes lookups for its own traversal. This
//! wrapper extends that to every configuration resolved against the same
//! provider, so `compile` and `testCompile` never ask twice about one module.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rigging_core::coordinate::{ModuleId, ModuleVersionId};
use tokio::sync::OnceCell;

use crate::metadata::{MetadataError, ModuleMetadata, ModuleMetadataProvider};

type Slot = Arc<OnceCell<Option<ModuleMetadata>>>;

/// A [`ModuleMetadataProvider`] that remembers successful answers
/// (including "not found") of the provider it wraps.
///
/// Concurrent lookups of one coordinate wait on a single upstream call.
/// Errors are not cached, so a later resolution may retry.
pub struct CachingMetadataProvider<P> {
    inner: P,
    entries: Mutex<HashMap<ModuleVersionId, Slot>>,
}

impl<P: ModuleMetadataProvider> CachingMetadataProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of coordinates with a cached answer.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|slot| slot.initialized()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: &ModuleVersionId) -> Slot {
        match self.entries.lock() {
            Ok(mut entries) => Arc::clone(entries.entry(id.clone()).or_default()),
            // A poisoned map only loses sharing; the lookup itself still works.
            Err(_) => Arc::new(OnceCell::new()),
        }
    }
}

#[async_trait]
impl<P: ModuleMetadataProvider> ModuleMetadataProvider for CachingMetadataProvider<P> {
    async fn lookup(&self, id: &ModuleVersionId) -> Result<Option<ModuleMetadata>, MetadataError> {
        let slot = self.slot(id);
        let cached = slot
            .get_or_try_init(|| async {
                tracing::debug!("metadata cache miss for {id}");
                self.inner.lookup(id).await
            })
            .await?;
        Ok(cached.clone())
    }

    async fn list_versions(&self, module: &ModuleId) -> Result<Vec<String>, MetadataError> {
        self.inner.list_versions(module).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::InMemoryRepository;

    fn id(s: &str) -> ModuleVersionId {
        ModuleVersionId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn repeated_lookups_hit_upstream_once() {
        let mut repo = InMemoryRepository::new();
        repo.module("org.a:a:1.0", &[]);
        let cache = CachingMetadataProvider::new(repo);

        for _ in 0..3 {
            assert!(cache.lookup(&id("org.a:a:1.0")).await.unwrap().is_some());
        }
        assert_eq!(cache.inner().lookup_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn not_found_is_cached_too() {
        let cache = CachingMetadataProvider::new(InMemoryRepository::new());
        assert!(cache.lookup(&id("org.x:x:1.0")).await.unwrap().is_none());
        assert!(cache.lookup(&id("org.x:x:1.0")).await.unwrap().is_none());
        assert_eq!(cache.inner().lookup_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_call() {
        let mut repo = InMemoryRepository::new().with_lookup_delay(std::time::Duration::from_millis(20));
        repo.module("org.a:a:1.0", &[]);
        let cache = Arc::new(CachingMetadataProvider::new(repo));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.lookup(&id("org.a:a:1.0")).await.unwrap().is_some()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(cache.inner().lookup_count(), 1);
    }
}
