//! Price engine: derives the live [`PriceBreakdown`] from the selection store.
//!
//! Slot prices are recomputed synchronously inside the selection notification.
//! The add-on price goes through a debounced, asynchronous recomputation:
//!
//! 1. Every selection change that has (or had) add-ons schedules a timer,
//!    replacing any timer that has not fired yet.
//! 2. When a timer fires it takes the next sequence number as its epoch and
//!    asks the [`AddonPricer`] for the add-on total.
//! 3. The result commits only if its epoch is still the latest one. A slower
//!    computation that fired earlier can never overwrite a newer result.
//!
//! In-flight computations are never cancelled; stale ones are dropped when they
//! finish.
//!
//! Every state change is queued for subscribers while the state lock is held,
//! so subscribers see states in commit order even when the synchronous path
//! and a commit run on different threads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{CalculationError, TripError};
use crate::listeners::{Listeners, SubscriptionId};
use crate::selection::{SelectionState, SelectionStore};

use super::calculators::price_breakdown;
use super::models::{EngineStats, PriceBreakdown, PriceState};
use super::services::AddonPricer;

/// Message recorded when the add-on recomputation fails
pub const CALCULATION_ERROR_MESSAGE: &str = "Failed to calculate addon prices";

/// Message recorded when the trip total does not fit in a `u64`
pub const PRICE_OVERFLOW_MESSAGE: &str = "Trip total is too large";

fn error_message(error: &CalculationError) -> &'static str {
    match error {
        CalculationError::Overflow => PRICE_OVERFLOW_MESSAGE,
        _ => CALCULATION_ERROR_MESSAGE,
    }
}

struct PendingTimer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Counters {
    scheduled: AtomicU64,
    fired: AtomicU64,
    committed: AtomicU64,
    discarded: AtomicU64,
    failed: AtomicU64,
}

struct Shared {
    config: EngineConfig,
    pricer: Arc<dyn AddonPricer>,
    runtime: Handle,
    store: Arc<SelectionStore>,
    state: Mutex<PriceState>,
    /// Epoch fence; only ever incremented
    sequence: AtomicU64,
    next_timer: AtomicU64,
    pending: Mutex<Option<PendingTimer>>,
    had_addons: AtomicBool,
    disposed: AtomicBool,
    listeners: Listeners<PriceState>,
    counters: Counters,
}

/// Live price derivation over a [`SelectionStore`]
pub struct PriceEngine {
    shared: Arc<Shared>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl PriceEngine {
    /// Create an engine and subscribe it to `store`.
    ///
    /// Must be called from within a tokio runtime; timers and computations are
    /// spawned on that runtime. The engine starts idle with an empty breakdown.
    pub fn new(
        store: Arc<SelectionStore>,
        pricer: Arc<dyn AddonPricer>,
        config: EngineConfig,
    ) -> Result<Self, TripError> {
        let runtime = Handle::try_current()
            .map_err(|e| TripError::Config(format!("price engine needs a tokio runtime: {}", e)))?;

        let shared = Arc::new(Shared {
            config,
            pricer,
            runtime,
            store: Arc::clone(&store),
            state: Mutex::new(PriceState::default()),
            sequence: AtomicU64::new(0),
            next_timer: AtomicU64::new(0),
            pending: Mutex::new(None),
            had_addons: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            listeners: Listeners::new(),
            counters: Counters::default(),
        });

        let weak = Arc::downgrade(&shared);
        let subscription = store.subscribe(move |selection| {
            if let Some(shared) = weak.upgrade() {
                shared.on_selection(selection);
            }
        });

        Ok(Self {
            shared,
            subscription: Mutex::new(Some(subscription)),
        })
    }

    /// Most recently committed breakdown
    pub fn breakdown(&self) -> Arc<PriceBreakdown> {
        Arc::clone(&self.shared.lock_state().breakdown)
    }

    pub fn state(&self) -> PriceState {
        self.shared.lock_state().clone()
    }

    /// Listen for state changes.
    ///
    /// Listeners run while other publishers wait on them and must not mutate
    /// the selection store.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PriceState) + Send + Sync + 'static,
    {
        self.shared.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.listeners.unsubscribe(id)
    }

    /// Current value of the sequence fence
    pub fn sequence(&self) -> u64 {
        self.shared.sequence.load(Ordering::SeqCst)
    }

    /// True when no timer is pending and no computation is outstanding
    pub fn is_settled(&self) -> bool {
        self.shared.lock_pending().is_none() && !self.shared.lock_state().calculating
    }

    pub fn stats(&self) -> EngineStats {
        let c = &self.shared.counters;
        EngineStats {
            scheduled: c.scheduled.load(Ordering::SeqCst),
            fired: c.fired.load(Ordering::SeqCst),
            committed: c.committed.load(Ordering::SeqCst),
            discarded: c.discarded.load(Ordering::SeqCst),
            failed: c.failed.load(Ordering::SeqCst),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::SeqCst)
    }

    /// Cancel the pending timer and detach from the selection store.
    ///
    /// Safe to call more than once. Computations already running finish but
    /// their results are dropped, and the engine stops reporting Calculating.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(timer) = self.shared.lock_pending().take() {
            timer.handle.abort();
        }
        self.shared.lock_state().calculating = false;

        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = subscription {
            self.shared.store.unsubscribe(id);
        }
        debug!("Price engine disposed");
    }
}

impl Drop for PriceEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Shared {
    fn on_selection(self: &Arc<Self>, selection: &Arc<SelectionState>) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        // Slot prices now, with the last committed add-on total
        {
            let mut state = self.lock_state();
            match price_breakdown(selection, state.breakdown.addons()) {
                Ok(breakdown) => {
                    state.breakdown = Arc::new(breakdown);
                    if state.error.as_deref() == Some(PRICE_OVERFLOW_MESSAGE) {
                        state.error = None;
                    }
                }
                Err(e) => {
                    // Keep the previous breakdown
                    warn!("Failed to price selection: {}", e);
                    state.error = Some(PRICE_OVERFLOW_MESSAGE.to_string());
                }
            }
            self.listeners.enqueue(state.clone());
        }
        self.listeners.flush();

        let has_addons = !selection.addons.is_empty();
        let had_addons = self.had_addons.swap(has_addons, Ordering::SeqCst);
        if has_addons || had_addons {
            self.schedule(selection.addon_ids());
        }
    }

    fn schedule(self: &Arc<Self>, addon_ids: Vec<String>) {
        self.counters.scheduled.fetch_add(1, Ordering::SeqCst);

        let mut pending = self.lock_pending();
        if let Some(previous) = pending.take() {
            previous.handle.abort();
            debug!("Replaced pending add-on recomputation {}", previous.id);
        }

        let id = self.next_timer.fetch_add(1, Ordering::SeqCst);
        let shared = Arc::clone(self);
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(shared.config.debounce).await;
            if let Some(epoch) = shared.claim(id) {
                shared.recompute(epoch, addon_ids).await;
            }
        });

        *pending = Some(PendingTimer { id, handle });
    }

    /// Claim the pending slot for timer `id` and mark the engine calculating.
    ///
    /// Both happen under the pending lock, so `is_settled` never sees the gap
    /// between them. Returns the computation's epoch, or `None` if the timer
    /// was replaced or the engine disposed.
    fn claim(&self, id: u64) -> Option<u64> {
        let mut pending = self.lock_pending();
        match pending.as_ref() {
            Some(timer) if timer.id == id => *pending = None,
            _ => return None,
        }
        if self.disposed.load(Ordering::SeqCst) {
            return None;
        }

        let epoch = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.fired.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.lock_state();
            state.calculating = true;
            self.listeners.enqueue(state.clone());
        }
        drop(pending);
        self.listeners.flush();
        Some(epoch)
    }

    async fn recompute(&self, epoch: u64, addon_ids: Vec<String>) {
        debug!("Add-on recomputation {} started for {:?}", epoch, addon_ids);

        let result = self.pricer.price_addons(&addon_ids).await;

        {
            let mut state = self.lock_state();
            if self.disposed.load(Ordering::SeqCst) {
                state.calculating = false;
                self.counters.discarded.fetch_add(1, Ordering::SeqCst);
                debug!("Dropped add-on recomputation {} after dispose", epoch);
                return;
            }
            if self.sequence.load(Ordering::SeqCst) != epoch {
                // The newer computation owns the calculating flag
                self.counters.discarded.fetch_add(1, Ordering::SeqCst);
                debug!("Discarded stale add-on recomputation {}", epoch);
                return;
            }

            let selection = self.store.get();
            match result.and_then(|addons_price| price_breakdown(&selection, addons_price)) {
                Ok(breakdown) => {
                    state.breakdown = Arc::new(breakdown);
                    state.calculating = false;
                    state.error = None;
                    self.counters.committed.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    warn!("Failed to update addon prices: {}", e);
                    // Keep the previous breakdown
                    state.calculating = false;
                    state.error = Some(error_message(&e).to_string());
                    self.counters.failed.fetch_add(1, Ordering::SeqCst);
                }
            }
            self.listeners.enqueue(state.clone());
        }
        self.listeners.flush();
    }

    fn lock_state(&self) -> MutexGuard<'_, PriceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingTimer>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
