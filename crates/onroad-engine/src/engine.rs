//! # Pricing Engine
//!
//! The rate table and computation cache, constructed once per process and
//! shared by `Arc`.

use onroad_core::breakup::{compute_breakup, region_charge};
use onroad_core::{EnergyType, Money, PriceBreakup, PriceQuote, PriceRequest, TaxRateTable};

use crate::cache::{CacheKey, CachePolicy, CacheStats, PriceCache};
use crate::config::PricingConfig;
use crate::location::LocationSnapshot;

/// Rate table plus memoized totals.
#[derive(Debug)]
pub struct PricingEngine {
    table: TaxRateTable,
    cache: PriceCache,
}

impl PricingEngine {
    pub fn new(table: TaxRateTable, policy: CachePolicy) -> Self {
        PricingEngine {
            table,
            cache: PriceCache::new(policy),
        }
    }

    /// Builtin rates, unbounded cache.
    pub fn builtin() -> Self {
        Self::new(TaxRateTable::builtin(), CachePolicy::unbounded())
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(config.rate_table(), config.cache_policy())
    }

    pub fn table(&self) -> &TaxRateTable {
        &self.table
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Full itemized breakup. Not cached.
    pub fn breakup(&self, base_price: Money, region: &str, energy: EnergyType) -> PriceBreakup {
        compute_breakup(&self.table, base_price, region, energy)
    }

    /// On-road total through the shared cache.
    pub fn total(&self, base_price: Money, region: &str, energy: EnergyType) -> Money {
        let key = CacheKey::new(base_price, region, energy);
        self.cache
            .get_or_compute(key, || compute_breakup(&self.table, base_price, region, energy).total)
    }

    pub fn region_charge(&self, base_price: Money, region: &str, energy: EnergyType) -> Money {
        region_charge(&self.table, base_price, region, energy)
    }

    /// Builds the quote every accessor hands out.
    pub fn quote(&self, request: &PriceRequest, location: &LocationSnapshot) -> PriceQuote {
        let region = location.region();
        let region_charge = request
            .include_breakup
            .then(|| self.region_charge(request.base_price, region, request.energy_type));

        PriceQuote {
            total_price: self.total(request.base_price, region, request.energy_type),
            base_price: request.base_price,
            region_charge,
            city: location.city().to_string(),
            region: region.to_string(),
            is_location_set: location.is_set,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::builtin()
    }
}
