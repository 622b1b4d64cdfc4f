//! # Listener Registry
//!
//! Shared plumbing for the location bus and the storage area: a list of
//! listeners with RAII subscriptions.
//!
//! ## Delivery
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  notify(filter, value)                                                  │
//! │     │                                                                   │
//! │     ├── lock ──► clone matching listeners ──► unlock                    │
//! │     │                                                                   │
//! │     └── call each listener(value)      (no lock held)                   │
//! │                                                                         │
//! │  A listener may therefore subscribe, unsubscribe or publish again.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::lock;

/// Callback receiving a new location string.
pub type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Wraps a closure as a [`Listener`].
pub fn listener(f: impl Fn(&str) + Send + Sync + 'static) -> Listener {
    Arc::new(f)
}

// =============================================================================
// Subscription
// =============================================================================

type Cancel = Box<dyn FnOnce() + Send + Sync>;

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancels: Vec<Cancel>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Subscription {
            cancels: vec![Box::new(cancel)],
        }
    }

    /// Combines two subscriptions; dropping the result cancels both.
    pub fn join(mut self, mut other: Subscription) -> Self {
        self.cancels.append(&mut other.cancels);
        self
    }

    /// Unsubscribes now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keeps the listener registered for as long as its source lives.
    pub fn detach(mut self) {
        self.cancels.clear();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for cancel in self.cancels.drain(..) {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("handles", &self.cancels.len())
            .finish()
    }
}

// =============================================================================
// Registry
// =============================================================================

struct Entry<M> {
    id: u64,
    meta: M,
    listener: Listener,
}

struct RegistryInner<M> {
    next_id: u64,
    entries: Vec<Entry<M>>,
}

/// Listener list tagged with per-listener metadata `M`.
pub(crate) struct Registry<M> {
    inner: Arc<Mutex<RegistryInner<M>>>,
}

impl<M: Send + 'static> Registry<M> {
    pub(crate) fn new() -> Self {
        Registry {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub(crate) fn register(&self, meta: M, listener: Listener) -> Subscription {
        let id = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Entry { id, meta, listener });
            id
        };

        let weak: Weak<Mutex<RegistryInner<M>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Calls every listener whose metadata passes `filter`.
    ///
    /// Returns the number of listeners called.
    pub(crate) fn notify(&self, filter: impl Fn(&M) -> bool, value: &str) -> usize {
        let targets: Vec<Listener> = lock(&self.inner)
            .entries
            .iter()
            .filter(|entry| filter(&entry.meta))
            .map(|entry| Arc::clone(&entry.listener))
            .collect();

        for target in &targets {
            target(value);
        }
        targets.len()
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }
}

impl<M> Clone for Registry<M> {
    fn clone(&self) -> Self {
        Registry {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry: Registry<()> = Registry::new();
        let (count, l) = counter();

        let sub = registry.register((), l);
        assert_eq!(registry.notify(|_| true, "Pune, Maharashtra"), 1);
        drop(sub);
        assert_eq!(registry.notify(|_| true, "Pune, Maharashtra"), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_filter_by_metadata() {
        let registry: Registry<u8> = Registry::new();
        let (a_count, a) = counter();
        let (b_count, b) = counter();
        let _a = registry.register(1, a);
        let _b = registry.register(2, b);

        registry.notify(|tag| *tag != 1, "x");
        assert_eq!(a_count.load(Ordering::SeqCst), 0);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_join_and_detach() {
        let registry: Registry<()> = Registry::new();
        let (_, a) = counter();
        let (_, b) = counter();

        let joined = registry.register((), a).join(registry.register((), Arc::clone(&b)));
        assert_eq!(registry.len(), 2);
        joined.unsubscribe();
        assert_eq!(registry.len(), 0);

        registry.register((), b).detach();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_listener_may_subscribe_during_delivery() {
        let registry: Registry<()> = Registry::new();
        let inner = registry.clone();
        let _sub = registry.register(
            (),
            listener(move |_| {
                inner.register((), listener(|_| {})).detach();
            }),
        );

        registry.notify(|_| true, "x");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_subscription_outliving_registry() {
        let registry: Registry<()> = Registry::new();
        let sub = registry.register((), listener(|_| {}));
        drop(registry);
        drop(sub);
    }
}
