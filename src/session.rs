//! Trip session: one catalog loader, one selection store and one price engine.
//!
//! This is the surface presentation code talks to. It is constructed at
//! session start and torn down with [`TripSession::dispose`].

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::catalog::{Addon, CatalogLoader, CatalogSnapshot, CatalogSource, HttpCatalogSource};
use crate::config::{Config, EngineConfig};
use crate::error::{Result, TripError};
use crate::listeners::SubscriptionId;
use crate::pricing::{
    price_difference, AddonPricer, CatalogAddonPricer, PriceBreakdown, PriceEngine, PriceState,
};
use crate::selection::{ComponentChange, SelectionState, SelectionStore, Slot};

/// Catalog load progress for presentation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStatus {
    pub is_loading: bool,
    pub is_loaded: bool,
    /// User-facing message from the last failed load
    pub error: Option<String>,
}

pub struct TripSession {
    loader: Arc<CatalogLoader>,
    store: Arc<SelectionStore>,
    engine: PriceEngine,
    catalog: Mutex<Option<Arc<CatalogSnapshot>>>,
    status: Mutex<LoadStatus>,
    hydrated: AtomicBool,
}

impl TripSession {
    /// Session over the HTTP catalog described by `config`
    pub fn new(config: &Config) -> Result<Self> {
        let source = HttpCatalogSource::new(&config.catalog)?;
        Self::with_source(Arc::new(source), config.engine.clone())
    }

    /// Session over any catalog source; add-ons are priced from that catalog
    pub fn with_source(source: Arc<dyn CatalogSource>, engine: EngineConfig) -> Result<Self> {
        let loader = Arc::new(CatalogLoader::new(source));
        let pricer = Arc::new(CatalogAddonPricer::new(Arc::clone(&loader)));
        Self::with_parts(loader, pricer, engine)
    }

    pub fn with_parts(
        loader: Arc<CatalogLoader>,
        pricer: Arc<dyn AddonPricer>,
        engine: EngineConfig,
    ) -> Result<Self> {
        let store = Arc::new(SelectionStore::new());
        let engine = PriceEngine::new(Arc::clone(&store), pricer, engine)?;
        Ok(Self {
            loader,
            store,
            engine,
            catalog: Mutex::new(None),
            status: Mutex::new(LoadStatus::default()),
            hydrated: AtomicBool::new(false),
        })
    }

    /// Load the catalog and hydrate the default trip.
    ///
    /// Idempotent: the catalog is fetched once and the default trip is applied
    /// only on the first successful load. On failure the status records a
    /// user-facing message and the call may be retried.
    pub async fn load_catalog(&self) -> Result<Arc<CatalogSnapshot>> {
        {
            let mut status = lock(&self.status);
            status.is_loading = true;
            status.error = None;
        }

        let result = self.loader.load().await.map_err(TripError::from);

        let mut status = lock(&self.status);
        status.is_loading = false;
        match result {
            Ok(catalog) => {
                status.is_loaded = true;
                drop(status);
                *lock(&self.catalog) = Some(Arc::clone(&catalog));

                if !self.hydrated.swap(true, Ordering::SeqCst) {
                    self.store
                        .replace(SelectionState::from_catalog_defaults(&catalog));
                    info!("Hydrated trip '{}' from catalog", catalog.trip.name);
                }
                Ok(catalog)
            }
            Err(e) => {
                status.error = Some(e.user_message().to_string());
                Err(e)
            }
        }
    }

    /// Loaded catalog, if any
    pub fn catalog(&self) -> Option<Arc<CatalogSnapshot>> {
        lock(&self.catalog).clone()
    }

    pub fn load_status(&self) -> LoadStatus {
        lock(&self.status).clone()
    }

    pub fn selection(&self) -> Arc<SelectionState> {
        self.store.get()
    }

    pub fn breakdown(&self) -> Arc<PriceBreakdown> {
        self.engine.breakdown()
    }

    pub fn price_state(&self) -> PriceState {
        self.engine.state()
    }

    pub fn set_component(&self, change: ComponentChange) {
        self.store.set_component(change);
    }

    pub fn toggle_addon(&self, addon: Addon, included: bool) {
        self.store.toggle_addon(addon, included);
    }

    pub fn is_selected(&self, slot: Slot) -> bool {
        self.store.is_selected(slot)
    }

    pub fn has_changes(&self) -> bool {
        self.store.has_changes()
    }

    /// Price delta the change would cause, for "+€50" style hints
    pub fn price_difference(&self, change: &ComponentChange) -> i64 {
        price_difference(&self.store.get(), change)
    }

    /// Clear all selections
    pub fn reset(&self) {
        self.store.reset();
    }

    pub fn subscribe_selection<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Arc<SelectionState>) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe_selection(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn subscribe_price<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PriceState) + Send + Sync + 'static,
    {
        self.engine.subscribe(listener)
    }

    pub fn unsubscribe_price(&self, id: SubscriptionId) -> bool {
        self.engine.unsubscribe(id)
    }

    pub fn engine(&self) -> &PriceEngine {
        &self.engine
    }

    /// Stop the price engine. Idempotent.
    pub fn dispose(&self) {
        self.engine.dispose();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
