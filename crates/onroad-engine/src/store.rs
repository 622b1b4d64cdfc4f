//! # Key-Value Storage
//!
//! Backends for the persisted location selector, and the shared
//! [`StorageArea`] that turns writes into cross-context notifications.
//!
//! ## Storage Events
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         StorageArea                                     │
//! │                                                                         │
//! │   Context A ──set("selectedCity", "Pune, Maharashtra")──┐               │
//! │                                                         ▼               │
//! │                                              ┌─────────────────────┐    │
//! │                                              │   KeyValueStore     │    │
//! │                                              │ (memory | JSON file)│    │
//! │                                              └─────────────────────┘    │
//! │                                                         │               │
//! │           watchers of "selectedCity" in contexts ≠ A ◄──┘               │
//! │                                                                         │
//! │   The writer's own context is NOT notified here; same-context          │
//! │   delivery goes through its LocationBus.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::lock;
use crate::notify::{Listener, Registry, Subscription};

// =============================================================================
// Key-Value Backends
// =============================================================================

/// A string-to-string store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> EngineResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> EngineResult<()>;
    fn remove(&self, key: &str) -> EngineResult<()>;
}

/// In-process backend.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let values = self
            .values
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> EngineResult<()> {
        self.values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// JSON object file backend.
///
/// Every read goes to disk, so separate processes sharing the file see each
/// other's writes on their next read. Writes replace the file through a
/// temporary sibling and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> EngineResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(EngineError::StorageFailed(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = ?self.path, keys = map.len(), "storage file written");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> EngineResult<()> {
        let _guard = lock(&self.write_lock);
        let mut map = self.read_map()?;
        apply(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> EngineResult<()> {
        self.update(|map| {
            map.remove(key);
        })
    }
}

// =============================================================================
// Execution Contexts
// =============================================================================

/// Identifies one execution context (a tab, a window, a worker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    pub fn new() -> Self {
        ContextId(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Storage Area
// =============================================================================

/// Storage shared by several execution contexts.
///
/// `set` persists the value and notifies watchers of the same key in every
/// other context. Removal is silent: listeners only ever receive a value.
pub struct StorageArea {
    backend: Arc<dyn KeyValueStore>,
    watchers: Registry<(ContextId, String)>,
}

impl StorageArea {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        StorageArea {
            backend,
            watchers: Registry::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileStore::new(path)))
    }

    pub fn get(&self, key: &str) -> EngineResult<Option<String>> {
        self.backend.get(key)
    }

    /// Persists `value` and notifies the other contexts.
    ///
    /// Nothing is delivered if the write fails.
    pub fn set(&self, origin: ContextId, key: &str, value: &str) -> EngineResult<()> {
        self.backend.set(key, value)?;

        let notified = self
            .watchers
            .notify(|(context, watched)| *context != origin && watched == key, value);
        debug!(%origin, key, notified, "storage event");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> EngineResult<()> {
        self.backend.remove(key)
    }

    /// Watches `key` on behalf of `context`.
    pub fn watch(&self, context: ContextId, key: &str, listener: Listener) -> Subscription {
        self.watchers.register((context, key.to_string()), listener)
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }
}

impl fmt::Debug for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageArea")
            .field("watchers", &self.watcher_count())
            .finish()
    }
}

/// Reads `key`, logging and swallowing storage failures.
pub(crate) fn read_or_warn(area: &StorageArea, key: &str) -> Option<String> {
    match area.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Failed to read location from storage");
            None
        }
    }
}
