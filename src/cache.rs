//! In-memory catalog caching using moka
//!
//! The catalog never changes during a session, so entries have no TTL. They
//! live until explicitly invalidated or until the cache is dropped.

use moka::future::Cache;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::CatalogSnapshot;
use crate::error::CatalogError;

/// Cache holding parsed catalog snapshots (source key -> snapshot)
#[derive(Clone)]
pub struct CatalogCache {
    snapshots: Cache<String, Arc<CatalogSnapshot>>,
    fetches: Arc<AtomicU64>,
}

impl CatalogCache {
    /// Create a new cache instance
    pub fn new() -> Self {
        Self {
            // One snapshot per source; a session normally uses a single source
            snapshots: Cache::builder().max_capacity(8).build(),
            fetches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Return the cached snapshot for `key`, running `init` if there is none.
    ///
    /// Concurrent callers for the same key share a single in-flight `init`.
    /// Failures are not cached.
    pub async fn get_or_load<F>(&self, key: &str, init: F) -> Result<Arc<CatalogSnapshot>, CatalogError>
    where
        F: Future<Output = Result<CatalogSnapshot, CatalogError>>,
    {
        if let Some(cached) = self.snapshots.get(key).await {
            debug!("Cache HIT for catalog: {}", key);
            return Ok(cached);
        }

        debug!("Cache MISS for catalog: {}", key);
        let fetches = Arc::clone(&self.fetches);
        self.snapshots
            .try_get_with(key.to_string(), async move {
                fetches.fetch_add(1, Ordering::Relaxed);
                init.await.map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Whether a snapshot is cached for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.snapshots.contains_key(key)
    }

    /// Invalidate the snapshot for `key`
    pub async fn invalidate(&self, key: &str) {
        self.snapshots.invalidate(key).await;
        info!("Catalog cache invalidated for: {}", key);
    }

    /// Invalidate all snapshots
    pub fn invalidate_all(&self) {
        self.snapshots.invalidate_all();
        info!("All catalog caches invalidated");
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            snapshots: self.snapshots.entry_count(),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub snapshots: u64,
    /// Number of fetch-and-parse runs started through this cache
    pub fetches: u64,
}
