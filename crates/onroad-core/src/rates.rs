//! # Tax Rate Table
//!
//! Per-region, per-energy-type registration percentages.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  percentage_for("delhi", EnergyType::Diesel)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize: trim + lowercase ──► "delhi"                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  index lookup ──── hit ────► Delhi entry ──► diesel = 1200 bps          │
//! │       │                                                                 │
//! │      miss ("atlantis")                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  default region entry (Maharashtra) ──► rate for the energy type        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups never fail. The table only errors at construction time, when a
//! custom entry list is inconsistent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{EnergyType, TaxRate};
use crate::DEFAULT_REGION;

/// Built-in rates in basis points: (region, petrol, diesel, cng, electric).
const BUILTIN_RATES: &[(&str, u32, u32, u32, u32)] = &[
    ("Maharashtra", 1300, 1500, 1300, 1000),
    ("Delhi", 1000, 1200, 1000, 800),
    ("Karnataka", 1400, 1600, 1400, 1000),
    ("Tamil Nadu", 1200, 1400, 1200, 900),
    ("Gujarat", 1100, 1300, 1100, 800),
    ("Uttar Pradesh", 1000, 1200, 1000, 800),
    ("West Bengal", 1200, 1400, 1200, 900),
    ("Rajasthan", 1100, 1300, 1100, 800),
    ("Madhya Pradesh", 1100, 1300, 1100, 800),
    ("Telangana", 1300, 1500, 1300, 1000),
    ("Andhra Pradesh", 1200, 1400, 1200, 900),
    ("Kerala", 1300, 1500, 1300, 1000),
    ("Punjab", 1000, 1200, 1000, 800),
    ("Haryana", 1000, 1200, 1000, 800),
    ("Bihar", 1100, 1300, 1100, 800),
    ("Odisha", 1200, 1400, 1200, 900),
    ("Assam", 1100, 1300, 1100, 800),
    ("Jharkhand", 1100, 1300, 1100, 800),
    ("Chhattisgarh", 1100, 1300, 1100, 800),
    ("Uttarakhand", 1000, 1200, 1000, 800),
    ("Himachal Pradesh", 900, 1100, 900, 700),
    ("Goa", 800, 1000, 800, 600),
    ("Jammu and Kashmir", 900, 1100, 900, 700),
    ("Chandigarh", 800, 1000, 800, 600),
    ("Puducherry", 800, 1000, 800, 600),
];

// =============================================================================
// Tax Rate Entry
// =============================================================================

/// Registration percentages for one region.
///
/// Serialized flat so config files can list overrides as
/// `{ region = "Goa", petrol = 800, diesel = 1000, cng = 800, electric = 600 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRateEntry {
    pub region: String,
    pub petrol: TaxRate,
    pub diesel: TaxRate,
    pub cng: TaxRate,
    pub electric: TaxRate,
}

impl TaxRateEntry {
    /// Creates an entry from basis points.
    pub fn from_bps(region: impl Into<String>, petrol: u32, diesel: u32, cng: u32, electric: u32) -> Self {
        TaxRateEntry {
            region: region.into(),
            petrol: TaxRate::from_bps(petrol),
            diesel: TaxRate::from_bps(diesel),
            cng: TaxRate::from_bps(cng),
            electric: TaxRate::from_bps(electric),
        }
    }

    /// The rate for an energy type; `Unknown` uses the petrol rate.
    pub fn rate_for(&self, energy: EnergyType) -> TaxRate {
        match energy {
            EnergyType::Petrol | EnergyType::Unknown => self.petrol,
            EnergyType::Diesel => self.diesel,
            EnergyType::Cng => self.cng,
            EnergyType::Electric => self.electric,
        }
    }
}

// =============================================================================
// Tax Rate Table
// =============================================================================

/// Region-keyed rate table with a default fallback entry.
///
/// ## Invariants
/// - Exactly one entry per region (case-insensitive)
/// - The default region is always present
#[derive(Debug, Clone)]
pub struct TaxRateTable {
    entries: Vec<TaxRateEntry>,
    index: HashMap<String, usize>,
    default_index: usize,
}

impl TaxRateTable {
    /// The built-in table (25 regions, Maharashtra as default).
    pub fn builtin() -> Self {
        let mut table = TaxRateTable {
            entries: Vec::with_capacity(BUILTIN_RATES.len()),
            index: HashMap::with_capacity(BUILTIN_RATES.len()),
            default_index: 0,
        };
        for &(region, petrol, diesel, cng, electric) in BUILTIN_RATES {
            table.upsert(TaxRateEntry::from_bps(region, petrol, diesel, cng, electric));
        }
        // Maharashtra is the first builtin row
        table.default_index = table.index.get(&normalize(DEFAULT_REGION)).copied().unwrap_or(0);
        table
    }

    /// Builds a table from a custom entry list.
    ///
    /// ## Errors
    /// - [`CoreError::DuplicateRegion`] if two entries share a region name
    /// - [`CoreError::UnknownDefaultRegion`] if `default_region` has no entry
    pub fn from_entries(entries: Vec<TaxRateEntry>, default_region: &str) -> CoreResult<Self> {
        let mut table = TaxRateTable {
            entries: Vec::with_capacity(entries.len()),
            index: HashMap::with_capacity(entries.len()),
            default_index: 0,
        };

        for entry in entries {
            if table.index.contains_key(&normalize(&entry.region)) {
                return Err(CoreError::DuplicateRegion(entry.region));
            }
            table.upsert(entry);
        }

        table.default_index = *table
            .index
            .get(&normalize(default_region))
            .ok_or_else(|| CoreError::UnknownDefaultRegion(default_region.to_string()))?;

        Ok(table)
    }

    /// Replaces matching regions and appends new ones.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = TaxRateEntry>) -> Self {
        for entry in overrides {
            self.upsert(entry);
        }
        self
    }

    fn upsert(&mut self, entry: TaxRateEntry) {
        let key = normalize(&entry.region);
        match self.index.get(&key) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// The percentage for a region and energy type.
    ///
    /// Unknown regions use the default region's rates.
    ///
    /// ## Example
    /// ```rust
    /// use onroad_core::{EnergyType, TaxRateTable};
    ///
    /// let table = TaxRateTable::builtin();
    /// assert_eq!(table.percentage_for("delhi", EnergyType::Diesel).bps(), 1200);
    /// assert_eq!(
    ///     table.percentage_for("Atlantis", EnergyType::Petrol),
    ///     table.percentage_for("Maharashtra", EnergyType::Petrol),
    /// );
    /// ```
    pub fn percentage_for(&self, region: &str, energy: EnergyType) -> TaxRate {
        self.entry_for(region).rate_for(energy)
    }

    /// The entry for a region, falling back to the default entry.
    pub fn entry_for(&self, region: &str) -> &TaxRateEntry {
        self.lookup(region).unwrap_or_else(|| self.default_entry())
    }

    /// The entry for a region, without fallback.
    pub fn lookup(&self, region: &str) -> Option<&TaxRateEntry> {
        self.index.get(&normalize(region)).map(|&i| &self.entries[i])
    }

    /// Whether the region has its own entry.
    pub fn contains(&self, region: &str) -> bool {
        self.index.contains_key(&normalize(region))
    }

    pub fn default_entry(&self) -> &TaxRateEntry {
        &self.entries[self.default_index]
    }

    pub fn default_region(&self) -> &str {
        &self.default_entry().region
    }

    /// All entries in insertion order.
    pub fn regions(&self) -> impl Iterator<Item = &TaxRateEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TaxRateTable {
    fn default() -> Self {
        TaxRateTable::builtin()
    }
}

/// Region key normalization: surrounding whitespace ignored, case-insensitive.
pub(crate) fn normalize(region: &str) -> String {
    region.trim().to_lowercase()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = TaxRateTable::builtin();
        assert_eq!(table.len(), 25);
        assert_eq!(table.percentage_for("Maharashtra", EnergyType::Petrol).bps(), 1300);
        assert_eq!(table.percentage_for("Delhi", EnergyType::Diesel).bps(), 1200);
        assert_eq!(table.percentage_for("Karnataka", EnergyType::Electric).bps(), 1000);
        assert_eq!(table.percentage_for("Goa", EnergyType::Cng).bps(), 800);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let table = TaxRateTable::builtin();
        assert_eq!(
            table.percentage_for("TAMIL NADU", EnergyType::Diesel),
            table.percentage_for("tamil nadu", EnergyType::Diesel)
        );
        assert!(table.contains(" west bengal "));
    }

    #[test]
    fn test_unknown_region_falls_back_to_default() {
        let table = TaxRateTable::builtin();
        assert_eq!(table.default_region(), "Maharashtra");
        for energy in [EnergyType::Petrol, EnergyType::Diesel, EnergyType::Cng, EnergyType::Electric] {
            assert_eq!(
                table.percentage_for("Atlantis", energy),
                table.percentage_for("Maharashtra", energy)
            );
        }
        assert!(table.lookup("Atlantis").is_none());
    }

    #[test]
    fn test_unknown_energy_uses_petrol_rate() {
        let table = TaxRateTable::builtin();
        let hybrid = EnergyType::from_tag("Hybrid");
        assert_eq!(
            table.percentage_for("Maharashtra", hybrid),
            table.percentage_for("Maharashtra", EnergyType::Petrol)
        );
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let entries = vec![
            TaxRateEntry::from_bps("Goa", 800, 1000, 800, 600),
            TaxRateEntry::from_bps("GOA", 900, 1000, 800, 600),
        ];
        let err = TaxRateTable::from_entries(entries, "Goa").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateRegion(region) if region == "GOA"));
    }

    #[test]
    fn test_from_entries_requires_default_region() {
        let entries = vec![TaxRateEntry::from_bps("Goa", 800, 1000, 800, 600)];
        let err = TaxRateTable::from_entries(entries, "Maharashtra").unwrap_err();
        assert!(matches!(err, CoreError::UnknownDefaultRegion(_)));
    }

    #[test]
    fn test_custom_table_fallback() {
        let entries = vec![
            TaxRateEntry::from_bps("Goa", 800, 1000, 800, 600),
            TaxRateEntry::from_bps("Kerala", 1300, 1500, 1300, 1000),
        ];
        let table = TaxRateTable::from_entries(entries, "kerala").unwrap();
        assert_eq!(table.default_region(), "Kerala");
        assert_eq!(table.percentage_for("Nowhere", EnergyType::Diesel).bps(), 1500);
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let table = TaxRateTable::builtin().with_overrides(vec![
            TaxRateEntry::from_bps("delhi", 1100, 1300, 1100, 900),
            TaxRateEntry::from_bps("Ladakh", 700, 900, 700, 500),
        ]);
        assert_eq!(table.len(), 26);
        assert_eq!(table.percentage_for("Delhi", EnergyType::Petrol).bps(), 1100);
        assert_eq!(table.percentage_for("Ladakh", EnergyType::Electric).bps(), 500);
        assert_eq!(table.default_region(), "Maharashtra");
    }

    #[test]
    fn test_entry_serializes_flat() {
        let entry = TaxRateEntry::from_bps("Goa", 800, 1000, 800, 600);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["region"], "Goa");
        assert_eq!(json["diesel"], 1000);
    }
}
