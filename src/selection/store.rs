//! Selection store: the single writer of [`SelectionState`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::catalog::Addon;
use crate::listeners::{Listeners, SubscriptionId};

use super::models::{ComponentChange, SelectionState, Slot};

/// Holds the current selection and notifies subscribers on every mutation.
///
/// Each mutation publishes a new immutable snapshot to all subscribers
/// synchronously, before the mutating call returns. Snapshots reach
/// subscribers in mutation order across threads. A mutation made from inside
/// a subscriber is delivered after the current notification finishes.
pub struct SelectionStore {
    state: Mutex<Arc<SelectionState>>,
    has_changes: AtomicBool,
    listeners: Listeners<Arc<SelectionState>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::with_state(SelectionState::default())
    }

    pub fn with_state(state: SelectionState) -> Self {
        Self {
            state: Mutex::new(Arc::new(state)),
            has_changes: AtomicBool::new(false),
            listeners: Listeners::new(),
        }
    }

    /// Current snapshot
    pub fn get(&self) -> Arc<SelectionState> {
        Arc::clone(&self.lock())
    }

    /// Replace one slot wholesale.
    ///
    /// No toggle logic: to unselect, pass `None` (or an empty add-on list).
    pub fn set_component(&self, change: ComponentChange) {
        debug!("Selection change: {}", change.slot());
        self.mutate(true, |state| state.apply(change));
    }

    /// Add (`included == true`) or remove an add-on, matched by id
    pub fn toggle_addon(&self, addon: Addon, included: bool) {
        debug!("Toggle add-on {} -> {}", addon.id, included);
        self.mutate(true, |state| {
            if included {
                if !state.has_addon(&addon.id) {
                    state.addons.push(addon);
                }
            } else {
                state.addons.retain(|existing| existing.id != addon.id);
            }
        });
    }

    /// Replace the whole selection, e.g. when hydrating from the catalog
    pub fn replace(&self, state: SelectionState) {
        self.mutate(false, |current| *current = state);
    }

    /// Clear every slot
    pub fn reset(&self) {
        self.replace(SelectionState::default());
    }

    pub fn is_selected(&self, slot: Slot) -> bool {
        self.lock().is_selected(slot)
    }

    /// Whether the user changed anything since the last hydration/reset
    pub fn has_changes(&self) -> bool {
        self.has_changes.load(Ordering::SeqCst)
    }

    pub fn clear_changes(&self) {
        self.has_changes.store(false, Ordering::SeqCst);
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Arc<SelectionState>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn mutate(&self, user_change: bool, f: impl FnOnce(&mut SelectionState)) {
        {
            let mut guard = self.lock();
            let mut next = SelectionState::clone(&guard);
            f(&mut next);
            let next = Arc::new(next);
            *guard = Arc::clone(&next);
            self.has_changes.store(user_change, Ordering::SeqCst);
            // Queued under the state lock so delivery follows mutation order
            self.listeners.enqueue(next);
        }
        self.listeners.flush();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Arc<SelectionState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::fixtures::{addon, hotel, resort};
    use crate::catalog::CatalogItem;

    fn recording(store: &SelectionStore) -> Arc<Mutex<Vec<Arc<SelectionState>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |state| sink.lock().unwrap().push(Arc::clone(state)));
        seen
    }

    #[test]
    fn test_set_component_notifies_synchronously() {
        let store = SelectionStore::new();
        let seen = recording(&store);

        store.set_component(ComponentChange::Resort(Some(resort("R1", 500))));
        assert_eq!(seen.lock().unwrap().len(), 1);

        store.set_component(ComponentChange::Hotel(Some(hotel("H1", 300))));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].hotel.is_none());
        assert_eq!(seen[1].hotel.as_ref().map(|h| h.id()), Some("H1"));
        assert!(Arc::ptr_eq(&seen[1], &store.get()));
    }

    #[test]
    fn test_every_mutation_notifies_even_when_unchanged() {
        let store = SelectionStore::new();
        let seen = recording(&store);

        store.set_component(ComponentChange::Resort(Some(resort("R1", 500))));
        store.set_component(ComponentChange::Resort(Some(resort("R1", 500))));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_unselect_with_none() {
        let store = SelectionStore::new();
        store.set_component(ComponentChange::Resort(Some(resort("R1", 500))));
        store.set_component(ComponentChange::Resort(None));
        assert!(!store.is_selected(Slot::Resort));
    }

    #[test]
    fn test_toggle_addon_is_idempotent() {
        let store = SelectionStore::new();
        store.toggle_addon(addon("A1", 50), true);
        store.toggle_addon(addon("A1", 50), true);
        store.toggle_addon(addon("A2", 30), true);
        assert_eq!(store.get().addon_ids(), vec!["A1", "A2"]);

        store.toggle_addon(addon("A1", 50), false);
        store.toggle_addon(addon("A1", 50), false);
        assert_eq!(store.get().addon_ids(), vec!["A2"]);
    }

    #[test]
    fn test_add_then_remove_restores_selection() {
        let store = SelectionStore::new();
        store.toggle_addon(addon("A1", 50), true);
        let before = store.get();

        store.toggle_addon(addon("A2", 30), true);
        store.toggle_addon(addon("A2", 30), false);
        assert_eq!(*store.get(), *before);
    }

    #[test]
    fn test_change_tracking() {
        let store = SelectionStore::new();
        assert!(!store.has_changes());

        store.toggle_addon(addon("A1", 50), true);
        assert!(store.has_changes());

        store.clear_changes();
        assert!(!store.has_changes());

        store.set_component(ComponentChange::Hotel(Some(hotel("H1", 300))));
        store.replace(SelectionState::default());
        assert!(!store.has_changes());
    }

    #[test]
    fn test_reset_notifies() {
        let store = SelectionStore::new();
        store.set_component(ComponentChange::Hotel(Some(hotel("H1", 300))));
        let seen = recording(&store);

        store.reset();
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(*store.get(), SelectionState::default());
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = SelectionStore::new();
        let seen = Arc::new(Mutex::new(0));
        let sink = seen.clone();
        let id = store.subscribe(move |_| *sink.lock().unwrap() += 1);

        store.reset();
        assert!(store.unsubscribe(id));
        store.reset();
        assert_eq!(*seen.lock().unwrap(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_concurrent_mutations_notify_in_order() {
        let store = Arc::new(SelectionStore::new());
        let counts = Arc::new(Mutex::new(Vec::new()));
        {
            let sink = counts.clone();
            store.subscribe(move |state| sink.lock().unwrap().push(state.addons.len()));
        }

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.toggle_addon(addon(&format!("T{}-{}", t, i), 1), true);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every snapshot has exactly one more add-on than the one before
        assert_eq!(*counts.lock().unwrap(), (1..=200).collect::<Vec<usize>>());
    }
}
