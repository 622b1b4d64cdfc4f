//! # Price Accessors
//!
//! The public surface consumers use to obtain on-road prices.
//!
//! ## Consumer Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PricingContext                                 │
//! │               (engine + location context, built once)                   │
//! │                                                                         │
//! │   single_price(req) ─────► SinglePrice ── get() ──► PriceQuote          │
//! │                             │  mirror subscribed for its lifetime       │
//! │                             │  memo keyed on (mirror revision, req)     │
//! │                                                                         │
//! │   batch(items) ──────────► BatchPrice ─── get() ──► {id → PriceQuote}   │
//! │                                                                         │
//! │   batch_price(items) ────► {id → PriceQuote}   (one-shot)               │
//! │                                                                         │
//! │   Every path goes through PricingEngine::quote and the shared cache,   │
//! │   so single and batch totals agree for the same inputs and location.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Accessors never fail. Location problems resolve to the default region
//! with on-road mode off.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use onroad_core::{LocationSelection, PriceItem, PriceQuote, PriceRequest};
use tokio::sync::watch;
use tracing::debug;

use crate::config::PricingConfig;
use crate::engine::PricingEngine;
use crate::error::EngineResult;
use crate::location::{LocationContext, LocationMirror, LocationSnapshot, LocationStore};
use crate::lock;

// =============================================================================
// Pricing Context
// =============================================================================

/// Engine and location context, passed to every consumer.
#[derive(Debug, Clone)]
pub struct PricingContext {
    engine: Arc<PricingEngine>,
    location: LocationContext,
}

impl PricingContext {
    pub fn new(engine: Arc<PricingEngine>, location: LocationContext) -> Self {
        PricingContext { engine, location }
    }

    /// Builds engine and location context from configuration.
    pub fn from_config(config: &PricingConfig, store: Arc<dyn LocationStore>) -> Self {
        let engine = Arc::new(PricingEngine::from_config(config));
        let location = LocationContext::with_default(store, config.default_selection());
        Self::new(engine, location)
    }

    /// Another context sharing this engine (and its cache).
    pub fn with_location(&self, location: LocationContext) -> Self {
        Self::new(Arc::clone(&self.engine), location)
    }

    pub fn engine(&self) -> &Arc<PricingEngine> {
        &self.engine
    }

    pub fn location(&self) -> &LocationContext {
        &self.location
    }

    /// A live single-price accessor.
    pub fn single_price(&self, request: PriceRequest) -> SinglePrice {
        SinglePrice {
            engine: Arc::clone(&self.engine),
            mirror: self.location.mirror(),
            request,
            memo: Mutex::new(None),
        }
    }

    /// A live batch accessor.
    pub fn batch(&self, items: Vec<PriceItem>) -> BatchPrice {
        BatchPrice {
            engine: Arc::clone(&self.engine),
            mirror: self.location.mirror(),
            items,
            memo: Mutex::new(None),
        }
    }

    /// Prices every item against the current location, read once.
    pub fn batch_price(&self, items: &[PriceItem]) -> HashMap<String, PriceQuote> {
        price_items(&self.engine, items, &self.location.resolve())
    }

    /// One quote against the current location, without subscribing.
    pub fn quote(&self, request: &PriceRequest) -> PriceQuote {
        self.engine.quote(request, &self.location.resolve())
    }

    pub fn current_location(&self) -> LocationSnapshot {
        self.location.resolve()
    }

    pub fn select_location(&self, selection: &LocationSelection) -> EngineResult<()> {
        self.location.select(selection)
    }

    /// Drops every memoized total.
    pub fn clear_computation_cache(&self) {
        self.engine.clear_cache();
    }
}

fn price_items(
    engine: &PricingEngine,
    items: &[PriceItem],
    location: &LocationSnapshot,
) -> HashMap<String, PriceQuote> {
    let mut quotes = HashMap::with_capacity(items.len());
    for item in items {
        let request = PriceRequest::new(item.base_price, item.energy_type);
        // Later duplicates replace earlier ones
        quotes.insert(item.id.clone(), engine.quote(&request, location));
    }
    debug!(items = items.len(), region = %location.region(), "batch priced");
    quotes
}

// =============================================================================
// Single Price
// =============================================================================

/// One product's price, kept current with the location.
///
/// The quote is recomputed lazily on the first `get` after a location
/// change or a request update.
#[derive(Debug)]
pub struct SinglePrice {
    engine: Arc<PricingEngine>,
    mirror: LocationMirror,
    request: PriceRequest,
    memo: Mutex<Option<(u64, PriceQuote)>>,
}

impl SinglePrice {
    pub fn get(&self) -> PriceQuote {
        let revision = self.mirror.revision();
        let mut memo = lock(&self.memo);

        if let Some((seen, quote)) = memo.as_ref() {
            if *seen == revision {
                return quote.clone();
            }
        }

        let quote = self.engine.quote(&self.request, &self.mirror.current());
        *memo = Some((revision, quote.clone()));
        quote
    }

    pub fn request(&self) -> &PriceRequest {
        &self.request
    }

    /// Replaces the inputs.
    pub fn update(&mut self, request: PriceRequest) {
        if request != self.request {
            self.request = request;
            *lock(&self.memo) = None;
        }
    }

    pub fn location(&self) -> LocationSnapshot {
        self.mirror.current()
    }

    pub fn is_location_set(&self) -> bool {
        self.mirror.is_location_set()
    }

    /// Receiver that wakes whenever the location changes.
    pub fn changes(&self) -> watch::Receiver<LocationSnapshot> {
        self.mirror.watch()
    }
}

// =============================================================================
// Batch Price
// =============================================================================

/// A list's prices, kept current with the location.
#[derive(Debug)]
pub struct BatchPrice {
    engine: Arc<PricingEngine>,
    mirror: LocationMirror,
    items: Vec<PriceItem>,
    memo: Mutex<Option<(u64, HashMap<String, PriceQuote>)>>,
}

impl BatchPrice {
    pub fn get(&self) -> HashMap<String, PriceQuote> {
        let revision = self.mirror.revision();
        let mut memo = lock(&self.memo);

        if let Some((seen, quotes)) = memo.as_ref() {
            if *seen == revision {
                return quotes.clone();
            }
        }

        let quotes = price_items(&self.engine, &self.items, &self.mirror.current());
        *memo = Some((revision, quotes.clone()));
        quotes
    }

    pub fn items(&self) -> &[PriceItem] {
        &self.items
    }

    pub fn update(&mut self, items: Vec<PriceItem>) {
        if items != self.items {
            self.items = items;
            *lock(&self.memo) = None;
        }
    }

    pub fn location(&self) -> LocationSnapshot {
        self.mirror.current()
    }

    pub fn changes(&self) -> watch::Receiver<LocationSnapshot> {
        self.mirror.watch()
    }
}
