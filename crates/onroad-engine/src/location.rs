//! # Location Context & Change Notifier
//!
//! Resolves the current city/region from the persisted selector and keeps
//! every price consumer informed when it changes.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────────────┐   well-formed "City, Region"   ┌─────────────┐  │
//! │   │      UNSET       │ ─────────────────────────────► │     SET     │  │
//! │   │ default location │   (read on init, user action,  │ on-road on  │  │
//! │   │ on-road off      │    or a change notification)   │             │  │
//! │   └──────────────────┘                                └──────┬──────┘  │
//! │                                                              │ new     │
//! │                                                              ▼ value   │
//! │                                                            SET         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Notification Paths
//! ```text
//!   same context    writer ──► LocationBus ──► every subscriber, synchronously
//!   other contexts  writer ──► StorageArea ──► watchers in every OTHER context
//! ```
//!
//! No polling: a consumer only re-reads on init or when
//! [`LocationMirror::refresh`] is called explicitly.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use onroad_core::{LocationSelection, LOCATION_STORAGE_KEY};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::notify::{listener, Listener, Registry, Subscription};
use crate::store::{read_or_warn, ContextId, StorageArea};

// =============================================================================
// Location Bus
// =============================================================================

/// Same-context pub/sub channel carrying new location strings.
#[derive(Clone)]
pub struct LocationBus {
    registry: Registry<()>,
}

impl LocationBus {
    pub fn new() -> Self {
        LocationBus {
            registry: Registry::new(),
        }
    }

    /// Delivers `value` to every current subscriber before returning.
    pub fn publish(&self, value: &str) -> usize {
        self.registry.notify(|_| true, value)
    }

    pub fn subscribe(&self, on_change: Listener) -> Subscription {
        self.registry.register((), on_change)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for LocationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// =============================================================================
// Location Store
// =============================================================================

/// The persisted selector plus its change channel.
pub trait LocationStore: Send + Sync {
    /// The raw persisted string, if any.
    fn get(&self) -> EngineResult<Option<String>>;

    /// Persists `value` and notifies subscribers.
    fn set(&self, value: &str) -> EngineResult<()>;

    /// Registers `on_change` for new values.
    fn subscribe(&self, on_change: Listener) -> Subscription;
}

/// Single-context store held in memory.
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    value: RwLock<Option<String>>,
    bus: LocationBus,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts with `value` already persisted.
    pub fn with_value(value: impl Into<String>) -> Self {
        MemoryLocationStore {
            value: RwLock::new(Some(value.into())),
            bus: LocationBus::new(),
        }
    }
}

impl LocationStore for MemoryLocationStore {
    fn get(&self) -> EngineResult<Option<String>> {
        Ok(self
            .value
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn set(&self, value: &str) -> EngineResult<()> {
        *self
            .value
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(value.to_string());
        self.bus.publish(value);
        Ok(())
    }

    fn subscribe(&self, on_change: Listener) -> Subscription {
        self.bus.subscribe(on_change)
    }
}

/// One execution context's view of a shared [`StorageArea`].
///
/// Writes reach this context's subscribers through its bus and every other
/// context's subscribers through the area.
#[derive(Debug)]
pub struct StorageLocationStore {
    context: ContextId,
    area: Arc<StorageArea>,
    bus: LocationBus,
    key: String,
}

impl StorageLocationStore {
    pub fn new(area: Arc<StorageArea>, key: impl Into<String>) -> Self {
        StorageLocationStore {
            context: ContextId::new(),
            area,
            bus: LocationBus::new(),
            key: key.into(),
        }
    }

    /// A fresh in-memory area with the default key.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(StorageArea::in_memory()), LOCATION_STORAGE_KEY)
    }

    /// Another execution context over the same area and key.
    pub fn fork(&self) -> Self {
        Self::new(Arc::clone(&self.area), self.key.clone())
    }

    pub fn context_id(&self) -> ContextId {
        self.context
    }

    pub fn area(&self) -> &Arc<StorageArea> {
        &self.area
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl LocationStore for StorageLocationStore {
    fn get(&self) -> EngineResult<Option<String>> {
        self.area.get(&self.key)
    }

    fn set(&self, value: &str) -> EngineResult<()> {
        self.area.set(self.context, &self.key, value)?;
        self.bus.publish(value);
        Ok(())
    }

    fn subscribe(&self, on_change: Listener) -> Subscription {
        let local = self.bus.subscribe(Arc::clone(&on_change));
        let remote = self.area.watch(self.context, &self.key, on_change);
        local.join(remote)
    }
}

// =============================================================================
// Location Snapshot
// =============================================================================

/// The resolved location and whether it was actually chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSnapshot {
    #[serde(flatten)]
    pub selection: LocationSelection,
    /// On-road mode. `false` means the selection is the default.
    pub is_set: bool,
}

impl LocationSnapshot {
    pub fn unset(default: LocationSelection) -> Self {
        LocationSnapshot {
            selection: default,
            is_set: false,
        }
    }

    pub fn set(selection: LocationSelection) -> Self {
        LocationSnapshot {
            selection,
            is_set: true,
        }
    }

    pub fn city(&self) -> &str {
        &self.selection.city
    }

    pub fn region(&self) -> &str {
        &self.selection.region
    }
}

// =============================================================================
// Location Context
// =============================================================================

/// Resolves the current location and fans out changes.
#[derive(Clone)]
pub struct LocationContext {
    store: Arc<dyn LocationStore>,
    default: LocationSelection,
}

impl LocationContext {
    /// A context falling back to Mumbai, Maharashtra.
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self::with_default(store, LocationSelection::default())
    }

    pub fn with_default(store: Arc<dyn LocationStore>, default: LocationSelection) -> Self {
        LocationContext { store, default }
    }

    pub fn store(&self) -> &Arc<dyn LocationStore> {
        &self.store
    }

    pub fn default_selection(&self) -> &LocationSelection {
        &self.default
    }

    /// Reads the persisted selector once.
    ///
    /// Absent, malformed or unreadable values resolve to the default with
    /// on-road mode off.
    pub fn resolve(&self) -> LocationSnapshot {
        let raw = match self.store.get() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to read location, using default");
                None
            }
        };

        match raw {
            Some(raw) => match LocationSelection::parse(&raw) {
                Some(selection) => LocationSnapshot::set(selection),
                None => {
                    warn!(value = %raw, "Malformed stored location, using default");
                    LocationSnapshot::unset(self.default.clone())
                }
            },
            None => LocationSnapshot::unset(self.default.clone()),
        }
    }

    /// Persists a user's choice and notifies every consumer.
    pub fn select(&self, selection: &LocationSelection) -> EngineResult<()> {
        info!(city = %selection.city, region = %selection.region, "Location selected");
        self.store.set(&selection.to_storage_string())
    }

    pub fn subscribe(&self, on_change: Listener) -> Subscription {
        self.store.subscribe(on_change)
    }

    /// A consumer-local reactive copy of the location.
    ///
    /// Subscribes first, then reads the selector exactly once for the
    /// initial value. The initial value is revision 0.
    pub fn mirror(&self) -> LocationMirror {
        LocationMirror::new(self)
    }
}

impl fmt::Debug for LocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationContext")
            .field("default", &self.default)
            .finish()
    }
}

/// A location context over a shared storage area, as one new context.
pub fn storage_context(area: Arc<StorageArea>, key: &str, default: LocationSelection) -> LocationContext {
    LocationContext::with_default(Arc::new(StorageLocationStore::new(area, key)), default)
}

/// Reads the selection straight from a storage area.
pub fn peek_stored_selection(area: &StorageArea, key: &str) -> Option<LocationSelection> {
    read_or_warn(area, key).and_then(|raw| LocationSelection::parse(&raw))
}

// =============================================================================
// Location Mirror
// =============================================================================

struct MirrorState {
    sender: watch::Sender<LocationSnapshot>,
    revision: AtomicU64,
}

impl MirrorState {
    /// Applies a notification. Malformed values are ignored.
    fn apply_raw(&self, raw: &str) {
        match LocationSelection::parse(raw) {
            Some(selection) => self.apply(LocationSnapshot::set(selection)),
            None => warn!(value = %raw, "Ignoring malformed location update"),
        }
    }

    fn apply(&self, next: LocationSnapshot) {
        let changed = self.sender.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });

        if changed {
            let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(city = %next.selection.city, region = %next.selection.region, revision, "location mirror updated");
        }
    }
}

/// Consumer-local copy of the location, kept current by notifications.
///
/// The revision counter increases by one per observed change, which lets
/// accessors memoize on it. [`LocationMirror::watch`] hands async consumers
/// a receiver they can await.
pub struct LocationMirror {
    state: Arc<MirrorState>,
    context: LocationContext,
    _subscription: Subscription,
}

impl LocationMirror {
    fn new(context: &LocationContext) -> Self {
        let placeholder = LocationSnapshot::unset(context.default.clone());
        let (sender, _) = watch::channel(placeholder.clone());
        let state = Arc::new(MirrorState {
            sender,
            revision: AtomicU64::new(0),
        });

        // Subscribe before reading so no write can fall between the two.
        let weak: Weak<MirrorState> = Arc::downgrade(&state);
        let subscription = context.subscribe(listener(move |raw| {
            if let Some(state) = weak.upgrade() {
                state.apply_raw(raw);
            }
        }));

        // A notification delivered since subscribing is at least as new as
        // this read and wins.
        let initial = context.resolve();
        state.sender.send_if_modified(|current| {
            if *current == placeholder {
                *current = initial;
            }
            false
        });

        LocationMirror {
            state,
            context: context.clone(),
            _subscription: subscription,
        }
    }

    pub fn current(&self) -> LocationSnapshot {
        self.state.sender.borrow().clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.revision.load(Ordering::SeqCst)
    }

    pub fn is_location_set(&self) -> bool {
        self.state.sender.borrow().is_set
    }

    /// Receiver that wakes on every change.
    pub fn watch(&self) -> watch::Receiver<LocationSnapshot> {
        self.state.sender.subscribe()
    }

    /// Re-reads the persisted selector.
    ///
    /// Only a well-formed stored value is applied; an absent or malformed
    /// one leaves the mirror as it is.
    pub fn refresh(&self) {
        let resolved = self.context.resolve();
        if resolved.is_set {
            self.state.apply(resolved);
        }
    }
}

impl fmt::Debug for LocationMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationMirror")
            .field("current", &self.current())
            .field("revision", &self.revision())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn memory_context() -> (Arc<MemoryLocationStore>, LocationContext) {
        let store = Arc::new(MemoryLocationStore::new());
        let ctx = LocationContext::new(store.clone());
        (store, ctx)
    }

    #[test]
    fn test_resolve_unset_uses_default() {
        let (_, ctx) = memory_context();
        let snap = ctx.resolve();
        assert!(!snap.is_set);
        assert_eq!(snap.city(), "Mumbai");
        assert_eq!(snap.region(), "Maharashtra");
    }

    #[test]
    fn test_resolve_stored_value() {
        let ctx = LocationContext::new(Arc::new(MemoryLocationStore::with_value("Delhi, Delhi")));
        assert_eq!(ctx.resolve(), LocationSnapshot::set(LocationSelection::new("Delhi", "Delhi")));
    }

    #[test]
    fn test_resolve_malformed_is_unset() {
        let ctx = LocationContext::new(Arc::new(MemoryLocationStore::with_value("Delhi")));
        let snap = ctx.resolve();
        assert!(!snap.is_set);
        assert_eq!(snap.selection, LocationSelection::default());
    }

    #[test]
    fn test_custom_default() {
        let ctx = LocationContext::with_default(
            Arc::new(MemoryLocationStore::new()),
            LocationSelection::new("Chennai", "Tamil Nadu"),
        );
        assert_eq!(ctx.resolve().region(), "Tamil Nadu");
    }

    #[test]
    fn test_bus_delivers_synchronously() {
        let bus = LocationBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let sub = bus.subscribe(listener(move |v| s.lock().unwrap().push(v.to_string())));

        assert_eq!(bus.publish("Pune, Maharashtra"), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["Pune, Maharashtra".to_string()]);

        drop(sub);
        assert_eq!(bus.publish("Goa, Goa"), 0);
    }

    /// Counts reads of the persisted selector.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryLocationStore,
        reads: AtomicU64,
    }

    impl LocationStore for CountingStore {
        fn get(&self) -> EngineResult<Option<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get()
        }

        fn set(&self, value: &str) -> EngineResult<()> {
            self.inner.set(value)
        }

        fn subscribe(&self, on_change: Listener) -> Subscription {
            self.inner.subscribe(on_change)
        }
    }

    #[test]
    fn test_mirror_reads_selector_once() {
        let store = Arc::new(CountingStore {
            inner: MemoryLocationStore::with_value("Kochi, Kerala"),
            reads: AtomicU64::new(0),
        });
        let ctx = LocationContext::new(store.clone());

        let mirror = ctx.mirror();
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(mirror.current().city(), "Kochi");
        assert_eq!(mirror.revision(), 0);

        let unset = LocationContext::new(Arc::new(CountingStore::default()));
        assert!(!unset.mirror().is_location_set());
    }

    #[test]
    fn test_mirror_follows_selection() {
        let (_, ctx) = memory_context();
        let mirror = ctx.mirror();
        assert!(!mirror.is_location_set());
        assert_eq!(mirror.revision(), 0);

        ctx.select(&LocationSelection::new("Pune", "Maharashtra")).unwrap();
        assert!(mirror.is_location_set());
        assert_eq!(mirror.current().city(), "Pune");
        assert_eq!(mirror.revision(), 1);

        // Same value again is not a change
        ctx.select(&LocationSelection::new("Pune", "Maharashtra")).unwrap();
        assert_eq!(mirror.revision(), 1);
    }

    #[test]
    fn test_mirror_ignores_malformed_updates() {
        let (store, ctx) = memory_context();
        let mirror = ctx.mirror();

        store.set("Delhi, Delhi").unwrap();
        store.set("garbage").unwrap();

        assert_eq!(mirror.current(), LocationSnapshot::set(LocationSelection::new("Delhi", "Delhi")));
        assert_eq!(mirror.revision(), 1);
    }

    #[test]
    fn test_mirror_unsubscribes_on_drop() {
        let store = Arc::new(StorageLocationStore::in_memory());
        let ctx = LocationContext::new(store.clone());

        let mirror = ctx.mirror();
        assert_eq!(store.area().watcher_count(), 1);
        drop(mirror);
        assert_eq!(store.area().watcher_count(), 0);
    }

    #[test]
    fn test_forked_contexts_see_each_other() {
        let first = Arc::new(StorageLocationStore::in_memory());
        let second = Arc::new(first.fork());
        assert_ne!(first.context_id(), second.context_id());

        let ctx_a = LocationContext::new(first.clone());
        let ctx_b = LocationContext::new(second.clone());
        let mirror_a = ctx_a.mirror();
        let mirror_b = ctx_b.mirror();

        ctx_a.select(&LocationSelection::new("Jaipur", "Rajasthan")).unwrap();

        assert_eq!(mirror_a.current().city(), "Jaipur");
        assert_eq!(mirror_b.current().city(), "Jaipur");
        assert_eq!(ctx_b.resolve().region(), "Rajasthan");
    }

    #[test]
    fn test_refresh_picks_up_writes_from_another_area() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        // Two areas over one file behave like two processes: no events cross
        let ours = Arc::new(StorageArea::json_file(&path));
        let theirs = StorageArea::json_file(&path);

        let ctx = storage_context(Arc::clone(&ours), LOCATION_STORAGE_KEY, LocationSelection::default());
        let mirror = ctx.mirror();

        theirs.set(ContextId::new(), LOCATION_STORAGE_KEY, "Bhopal, Madhya Pradesh").unwrap();
        assert!(!mirror.is_location_set());

        mirror.refresh();
        assert_eq!(mirror.current().region(), "Madhya Pradesh");
        assert_eq!(
            peek_stored_selection(&ours, LOCATION_STORAGE_KEY),
            Some(LocationSelection::new("Bhopal", "Madhya Pradesh"))
        );

        // Removal leaves the mirror in the set state
        theirs.remove(LOCATION_STORAGE_KEY).unwrap();
        mirror.refresh();
        assert!(mirror.is_location_set());
    }

    #[tokio::test]
    async fn test_watch_receiver_wakes_on_change() {
        let (_, ctx) = memory_context();
        let mirror = ctx.mirror();
        let mut rx = mirror.watch();

        let writer = ctx.clone();
        let handle = tokio::spawn(async move {
            writer.select(&LocationSelection::new("Kochi", "Kerala")).unwrap();
        });

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().region(), "Kerala");
        handle.await.unwrap();
    }
}
