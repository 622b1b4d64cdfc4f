//! # Computation Cache
//!
//! Memoizes on-road totals per (base price, region, energy type).
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_or_compute(key, compute)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  entry present? ── yes ──► expired (ttl)? ── no ──► HIT: stored total   │
//! │       │                          │                                      │
//! │       no                        yes ──► drop entry                      │
//! │       │                          │                                      │
//! │       ▼◄─────────────────────────┘                                      │
//! │  MISS: compute() ──► sweep expired tail ──► push (may evict) ──► total  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog lists repeat the same price points across many variants, so one
//! entry typically serves several cards. Only the total is stored.
//!
//! The default policy is unbounded with no expiry; `max_entries` and `ttl`
//! opt into eviction. With a `ttl`, every insert first drops expired entries
//! from the least-recently-used end, so keys that are never looked up again
//! do not accumulate.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use onroad_core::{EnergyType, Money};
use serde::Serialize;
use tracing::debug;

use crate::lock;

// =============================================================================
// Cache Policy
// =============================================================================

/// Eviction policy for [`PriceCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    /// Least-recently-used bound. `None` keeps every entry.
    pub max_entries: Option<NonZeroUsize>,
    /// Entries older than this are recomputed. `None` never expires.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// No bound, no expiry.
    pub fn unbounded() -> Self {
        CachePolicy::default()
    }

    /// LRU-bounded to `max_entries` (a zero bound is treated as 1).
    pub fn bounded(max_entries: usize) -> Self {
        CachePolicy {
            max_entries: Some(NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN)),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

// =============================================================================
// Cache Key
// =============================================================================

/// The memoization key.
///
/// Region is normalized (trimmed, lowercase) because rate lookup is
/// case-insensitive; `"Delhi"` and `"DELHI"` share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    base_price: Money,
    region: String,
    energy: EnergyType,
}

impl CacheKey {
    pub fn new(base_price: Money, region: &str, energy: EnergyType) -> Self {
        CacheKey {
            base_price,
            region: region.trim().to_lowercase(),
            energy,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.base_price.paise(), self.region, self.energy)
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Counters for cache behavior.
///
/// `misses` equals the number of times the calculator ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub len: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache (0.0 when unused).
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// =============================================================================
// Price Cache
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    total: Money,
    inserted_at: Instant,
}

/// Shared memoization cache for on-road totals.
pub struct PriceCache {
    policy: CachePolicy,
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl PriceCache {
    pub fn new(policy: CachePolicy) -> Self {
        let entries = match policy.max_entries {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        PriceCache {
            policy,
            entries: Mutex::new(entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Returns the stored total, or runs `compute` and stores its result.
    ///
    /// The lock is not held while `compute` runs. Two callers missing on the
    /// same key at once both compute; the results are identical, and the
    /// later insert overwrites the earlier one.
    pub fn get_or_compute(&self, key: CacheKey, compute: impl FnOnce() -> Money) -> Money {
        if let Some(total) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return total;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let total = compute();
        debug!(key = %key, total = total.paise(), "price cache miss");

        let entry = CacheEntry {
            total,
            inserted_at: Instant::now(),
        };
        let mut entries = lock(&self.entries);
        self.sweep_expired_tail(&mut entries);
        let evicted = entries.push(key.clone(), entry);
        drop(entries);
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %evicted_key, "price cache eviction");
            }
        }

        total
    }

    fn lookup(&self, key: &CacheKey) -> Option<Money> {
        let mut entries = lock(&self.entries);
        let entry = *entries.get(key)?;

        if let Some(ttl) = self.policy.ttl {
            if entry.inserted_at.elapsed() >= ttl {
                entries.pop(key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        }

        Some(entry.total)
    }

    fn sweep_expired_tail(&self, entries: &mut LruCache<CacheKey, CacheEntry>) {
        let Some(ttl) = self.policy.ttl else {
            return;
        };
        let mut swept = 0u64;
        while let Some((_, entry)) = entries.peek_lru() {
            if entry.inserted_at.elapsed() < ttl {
                break;
            }
            entries.pop_lru();
            swept += 1;
        }
        if swept > 0 {
            self.expirations.fetch_add(swept, Ordering::Relaxed);
        }
    }

    /// Drops every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let Some(ttl) = self.policy.ttl else {
            return 0;
        };
        let mut entries = lock(&self.entries);
        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() >= ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        self.expirations.fetch_add(expired.len() as u64, Ordering::Relaxed);
        debug!(purged = expired.len(), "price cache purge");
        expired.len()
    }

    /// Whether a live (non-expired) entry exists, without touching LRU order.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let entries = lock(&self.entries);
        match entries.peek(key) {
            Some(entry) => self.policy.ttl.map_or(true, |ttl| entry.inserted_at.elapsed() < ttl),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        let mut entries = lock(&self.entries);
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "price cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            len: self.len(),
        }
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        PriceCache::new(CachePolicy::unbounded())
    }
}

impl fmt::Debug for PriceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceCache")
            .field("policy", &self.policy)
            .field("stats", &self.stats())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn key(rupees: i64, region: &str, energy: EnergyType) -> CacheKey {
        CacheKey::new(Money::from_rupees(rupees), region, energy)
    }

    #[test]
    fn test_hit_skips_compute() {
        let cache = PriceCache::default();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Money::from_rupees(588_200)
        };

        let first = cache.get_or_compute(key(500_000, "Delhi", EnergyType::Diesel), compute);
        let second = cache.get_or_compute(key(500_000, "Delhi", EnergyType::Diesel), compute);

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.len), (1, 1, 1));
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_region_is_case_insensitive_in_key() {
        assert_eq!(key(1, "Delhi", EnergyType::Petrol), key(1, " DELHI ", EnergyType::Petrol));
        assert_ne!(key(1, "Delhi", EnergyType::Petrol), key(1, "Delhi", EnergyType::Cng));
        assert_eq!(key(5, "Goa", EnergyType::Electric).to_string(), "500-goa-electric");
    }

    #[test]
    fn test_distinct_keys_compute_separately() {
        let cache = PriceCache::default();
        cache.get_or_compute(key(1, "Goa", EnergyType::Petrol), || Money::from_rupees(1));
        cache.get_or_compute(key(2, "Goa", EnergyType::Petrol), || Money::from_rupees(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_bounded_policy_evicts_least_recently_used() {
        let cache = PriceCache::new(CachePolicy::bounded(2));
        let a = key(1, "Goa", EnergyType::Petrol);
        let b = key(2, "Goa", EnergyType::Petrol);
        let c = key(3, "Goa", EnergyType::Petrol);

        cache.get_or_compute(a.clone(), || Money::from_rupees(1));
        cache.get_or_compute(b.clone(), || Money::from_rupees(2));
        // Touch `a` so `b` becomes least recently used
        cache.get_or_compute(a.clone(), || unreachable!());
        cache.get_or_compute(c.clone(), || Money::from_rupees(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_zero_bound_is_clamped() {
        let policy = CachePolicy::bounded(0);
        assert_eq!(policy.max_entries.map(NonZeroUsize::get), Some(1));
    }

    #[test]
    fn test_ttl_expires_entries() {
        let cache = PriceCache::new(CachePolicy::unbounded().with_ttl(Duration::ZERO));
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Money::from_rupees(10)
        };

        cache.get_or_compute(key(1, "Goa", EnergyType::Petrol), compute);
        cache.get_or_compute(key(1, "Goa", EnergyType::Petrol), compute);

        assert_eq!(calls.get(), 2);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_ttl_drops_keys_never_looked_up_again() {
        let cache = PriceCache::new(CachePolicy::unbounded().with_ttl(Duration::ZERO));
        for rupees in 1..=100 {
            cache.get_or_compute(key(rupees, "Goa", EnergyType::Petrol), || Money::from_rupees(rupees));
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expirations, 99);
    }

    #[test]
    fn test_purge_expired() {
        let cache = PriceCache::new(CachePolicy::unbounded().with_ttl(Duration::ZERO));
        cache.get_or_compute(key(1, "Goa", EnergyType::Petrol), || Money::from_rupees(1));
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());

        let unbounded = PriceCache::default();
        unbounded.get_or_compute(key(1, "Goa", EnergyType::Petrol), || Money::from_rupees(1));
        assert_eq!(unbounded.purge_expired(), 0);
        assert_eq!(unbounded.len(), 1);
    }

    #[test]
    fn test_long_ttl_keeps_entries() {
        let cache = PriceCache::new(CachePolicy::unbounded().with_ttl(Duration::from_secs(3600)));
        cache.get_or_compute(key(1, "Goa", EnergyType::Petrol), || Money::from_rupees(10));
        let again = cache.get_or_compute(key(1, "Goa", EnergyType::Petrol), || unreachable!());
        assert_eq!(again, Money::from_rupees(10));
    }

    #[test]
    fn test_clear_forces_recompute() {
        let cache = PriceCache::default();
        cache.get_or_compute(key(1, "Goa", EnergyType::Petrol), || Money::from_rupees(10));
        cache.clear();
        assert!(cache.is_empty());

        let calls = Cell::new(0);
        cache.get_or_compute(key(1, "Goa", EnergyType::Petrol), || {
            calls.set(1);
            Money::from_rupees(10)
        });
        assert_eq!(calls.get(), 1);
    }
}
