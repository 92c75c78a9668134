//! Synchronous listener registry shared by the selection and price stores.
//!
//! Values are delivered to every listener in subscription order, and values
//! are delivered in the order they were queued, even when several threads
//! publish at once. Producers queue a value with [`Listeners::enqueue`] while
//! still holding the lock that orders their own state, then call
//! [`Listeners::flush`] after releasing it.
//!
//! Listeners may subscribe or unsubscribe from inside a callback; the change
//! applies from the next notification.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct Listeners<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    queue: Mutex<VecDeque<T>>,
    /// Held for the whole of one delivery run
    delivery: Mutex<()>,
    /// Thread running the current delivery, if any
    owner: Mutex<Option<ThreadId>>,
}

/// Clears the delivery owner, also when a listener panics
struct OwnerReset<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for OwnerReset<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
            queue: Mutex::new(VecDeque::new()),
            delivery: Mutex::new(()),
            owner: Mutex::new(None),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    /// Queue and deliver a single value
    pub fn notify(&self, value: T) {
        self.enqueue(value);
        self.flush();
    }

    /// Queue a value without delivering it yet
    pub fn enqueue(&self, value: T) {
        lock(&self.queue).push_back(value);
    }

    /// Deliver every queued value, oldest first.
    ///
    /// Returns once everything queued before the call has reached the
    /// listeners. Called from inside a listener it returns at once; the
    /// running delivery picks the new value up after the current one.
    pub fn flush(&self) {
        let current = thread::current().id();
        if *lock(&self.owner) == Some(current) {
            return;
        }

        let _delivery = lock(&self.delivery);
        *lock(&self.owner) = Some(current);
        let _reset = OwnerReset(&self.owner);

        loop {
            let next = lock(&self.queue).pop_front();
            let Some(value) = next else {
                break;
            };
            // Snapshot so callbacks run without holding the lock
            let listeners: Vec<Listener<T>> = self.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
            for listener in listeners {
                listener(&value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener<T>)>> {
        lock(&self.entries)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_in_subscription_order() {
        let listeners: Listeners<u32> = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = seen.clone();
            listeners.subscribe(move |v: &u32| seen.lock().unwrap().push(format!("{}{}", tag, v)));
        }

        listeners.notify(1);
        listeners.notify(2);
        assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_unsubscribe() {
        let listeners: Listeners<u32> = Listeners::new();
        let count = Arc::new(AtomicU64::new(0));
        let id = {
            let count = count.clone();
            listeners.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        listeners.notify(1);
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.notify(2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_listener_can_subscribe_during_notify() {
        let listeners: Arc<Listeners<u32>> = Arc::new(Listeners::new());
        let inner = listeners.clone();
        listeners.subscribe(move |_| {
            inner.subscribe(|_| {});
        });

        listeners.notify(1);
        assert_eq!(listeners.len(), 2);
    }

    #[test]
    fn test_nested_notify_is_delivered_after_current() {
        let listeners: Arc<Listeners<u32>> = Arc::new(Listeners::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = listeners.clone();
        let sink = seen.clone();
        listeners.subscribe(move |v| {
            sink.lock().unwrap().push(*v);
            if *v == 1 {
                inner.notify(2);
                sink.lock().unwrap().push(10);
            }
        });

        listeners.notify(1);
        assert_eq!(*seen.lock().unwrap(), vec![1, 10, 2]);
    }

    #[test]
    fn test_values_from_threads_arrive_in_queue_order() {
        let listeners: Arc<Listeners<u32>> = Arc::new(Listeners::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let order = Arc::new(Mutex::new(0u32));
        {
            let sink = seen.clone();
            listeners.subscribe(move |v| {
                if *v == 1 {
                    // Slow first delivery while other threads queue behind it
                    thread::sleep(std::time::Duration::from_millis(50));
                }
                sink.lock().unwrap().push(*v);
            });
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let listeners = listeners.clone();
                let order = order.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        {
                            let mut next = order.lock().unwrap();
                            *next += 1;
                            listeners.enqueue(*next);
                        }
                        listeners.flush();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*seen.lock().unwrap(), (1..=100).collect::<Vec<u32>>());
    }
}
