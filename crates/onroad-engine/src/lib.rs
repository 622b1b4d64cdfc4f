//! # onroad-engine: Stateful Pricing Services
//!
//! This crate wraps the pure calculator in `onroad-core` with the shared
//! state a front end needs: memoized totals, the persisted location
//! selector, and change notification so every price on screen follows the
//! user's chosen city.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pricing Engine Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 PricingContext (built once, cloned)              │  │
//! │  │   single_price • batch_price • quote • select_location           │  │
//! │  └──────────────┬──────────────────────────────────┬────────────────┘  │
//! │                 │                                  │                    │
//! │                 ▼                                  ▼                    │
//! │  ┌────────────────────────────┐    ┌─────────────────────────────────┐ │
//! │  │       PricingEngine        │    │        LocationContext          │ │
//! │  │                            │    │                                 │ │
//! │  │  TaxRateTable              │    │  LocationStore (trait)          │ │
//! │  │  PriceCache (LRU / TTL)    │    │   ├─ MemoryLocationStore        │ │
//! │  │                            │    │   └─ StorageLocationStore       │ │
//! │  │                            │    │        ├─ LocationBus (local)   │ │
//! │  │                            │    │        └─ StorageArea (shared)  │ │
//! │  └────────────────────────────┘    │  LocationMirror (revision,      │ │
//! │                                    │   tokio watch)                  │ │
//! │                                    └─────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`accessor`] - `PricingContext`, `SinglePrice`, `BatchPrice`
//! - [`cache`] - Memoized computation cache
//! - [`config`] - Engine configuration (TOML + environment)
//! - [`engine`] - Rate table plus cache
//! - [`error`] - Engine error types
//! - [`location`] - Location context, bus, stores and mirrors
//! - [`notify`] - Listener registry and subscriptions
//! - [`store`] - Key-value backends and the shared storage area
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use onroad_core::{LocationSelection, Money, PriceRequest};
//! use onroad_engine::{LocationContext, MemoryLocationStore, PricingContext, PricingEngine};
//!
//! let ctx = PricingContext::new(
//!     Arc::new(PricingEngine::builtin()),
//!     LocationContext::new(Arc::new(MemoryLocationStore::new())),
//! );
//!
//! let price = ctx.single_price(PriceRequest::new(Money::from_rupees(500_000), "Diesel"));
//! assert!(!price.get().is_location_set);
//!
//! ctx.select_location(&LocationSelection::new("New Delhi", "Delhi")).unwrap();
//! assert_eq!(price.get().total_price, Money::from_rupees(588_200));
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod accessor;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod location;
pub mod notify;
pub mod store;

pub use accessor::{BatchPrice, PricingContext, SinglePrice};
pub use cache::{CacheKey, CachePolicy, CacheStats, PriceCache};
pub use config::PricingConfig;
pub use engine::PricingEngine;
pub use error::{EngineError, EngineResult};
pub use location::{
    LocationBus, LocationContext, LocationMirror, LocationSnapshot, LocationStore,
    MemoryLocationStore, StorageLocationStore,
};
pub use notify::{listener, Listener, Subscription};
pub use store::{ContextId, JsonFileStore, KeyValueStore, MemoryKeyValueStore, StorageArea};

/// Locks a mutex, recovering the data if a listener panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
