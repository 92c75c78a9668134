//! Catalog fetching and memoized loading.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{CacheStats, CatalogCache};
use crate::config::CatalogConfig;
use crate::error::CatalogError;

use super::models::CatalogSnapshot;

/// Where the raw catalog document comes from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Stable key identifying this source in the cache
    fn key(&self) -> String;

    /// Fetch the raw document body.
    async fn fetch(&self) -> Result<String, CatalogError>;
}

/// Fetches the catalog with a single HTTP GET
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogSource {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.catalog_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn key(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String, CatalogError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Loads the catalog once and serves the cached snapshot afterwards
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    cache: CatalogCache,
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self::with_cache(source, CatalogCache::new())
    }

    /// Build a loader over an existing (possibly shared) cache
    pub fn with_cache(source: Arc<dyn CatalogSource>, cache: CatalogCache) -> Self {
        Self { source, cache }
    }

    /// Return the catalog, fetching and parsing it on first use.
    ///
    /// Concurrent first calls share one fetch. Errors are returned to the
    /// caller without retry and leave nothing cached.
    pub async fn load(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let key = self.source.key();
        let source = Arc::clone(&self.source);

        let result = self
            .cache
            .get_or_load(&key, async move {
                let body = source.fetch().await?;
                let snapshot = CatalogSnapshot::from_yaml_str(&body)?;
                info!(
                    "Catalog loaded: {} resorts, {} hotels, {} add-ons",
                    snapshot.available_resorts.len(),
                    snapshot.available_hotels.len(),
                    snapshot.available_addons.len()
                );
                Ok(snapshot)
            })
            .await;

        if let Err(e) = &result {
            warn!("Failed to load trip catalog from {}: {}", key, e);
        }
        result
    }

    /// Whether a snapshot is already cached
    pub fn is_loaded(&self) -> bool {
        self.cache.contains(&self.source.key())
    }

    /// Drop the cached snapshot so the next `load` fetches again
    pub async fn invalidate(&self) {
        self.cache.invalidate(&self.source.key()).await;
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory source that counts fetches and can be reprogrammed
    pub struct StaticSource {
        body: Mutex<Result<String, CatalogError>>,
        delay: Duration,
        pub calls: AtomicUsize,
    }

    impl StaticSource {
        pub fn ok(body: &str) -> Self {
            Self::with_result(Ok(body.to_string()))
        }

        pub fn with_result(result: Result<String, CatalogError>) -> Self {
            Self {
                body: Mutex::new(result),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn set(&self, result: Result<String, CatalogError>) {
            *self.body.lock().unwrap() = result;
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogSource for StaticSource {
        fn key(&self) -> String {
            "static://trip-data.yml".to_string()
        }

        async fn fetch(&self) -> Result<String, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.body.lock().unwrap().clone()
        }
    }
}
