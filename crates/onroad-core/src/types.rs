//! # Domain Types
//!
//! Core domain types used throughout onroad.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │   EnergyType    │   │LocationSelection│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Petrol, Diesel │   │  city           │       │
//! │  │  1300 = 13%     │   │  Cng, Electric  │   │  region         │       │
//! │  └─────────────────┘   │  Unknown        │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  PriceBreakup   │   │  PriceRequest   │   │   PriceQuote    │       │
//! │  │  ─────────────  │   │  PriceItem      │   │  ─────────────  │       │
//! │  │  components     │   │  (inputs)       │   │  total_price    │       │
//! │  │  total          │   └─────────────────┘   │  city / region  │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::{DEFAULT_CITY, DEFAULT_REGION};

// =============================================================================
// Tax Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so 4.6% insurance is exactly 460 bps
/// and every rate in the table stays an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a rate from a percentage (for config convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Energy Type
// =============================================================================

/// The fuel or energy source of a variant.
///
/// Catalog data carries free-form tags ("Petrol", "Diesel AT", "CNG",
/// "Electric"). They are resolved once, at the boundary, with
/// [`EnergyType::from_tag`]; everything past that point matches on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    Petrol,
    Diesel,
    Cng,
    Electric,
    /// Any tag that matched nothing above ("Hybrid", "Hydrogen", "").
    /// Priced at the region's petrol rate.
    Unknown,
}

impl EnergyType {
    /// Resolves a free-form catalog tag.
    ///
    /// ## Matching Rules (case-insensitive, first match wins)
    /// ```text
    ///   contains "petrol" | "gasoline"  → Petrol
    ///   contains "diesel"               → Diesel
    ///   contains "cng"    | "gas"       → Cng
    ///   contains "electric" | "ev"      → Electric
    ///   otherwise                       → Unknown
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use onroad_core::EnergyType;
    ///
    /// assert_eq!(EnergyType::from_tag("Petrol"), EnergyType::Petrol);
    /// assert_eq!(EnergyType::from_tag("gasoline turbo"), EnergyType::Petrol);
    /// assert_eq!(EnergyType::from_tag("Hybrid"), EnergyType::Unknown);
    /// ```
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_lowercase();

        if tag.contains("petrol") || tag.contains("gasoline") {
            EnergyType::Petrol
        } else if tag.contains("diesel") {
            EnergyType::Diesel
        } else if tag.contains("cng") || tag.contains("gas") {
            EnergyType::Cng
        } else if tag.contains("electric") || tag.contains("ev") {
            EnergyType::Electric
        } else {
            EnergyType::Unknown
        }
    }

    /// Stable lowercase name, also used in cache keys.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EnergyType::Petrol => "petrol",
            EnergyType::Diesel => "diesel",
            EnergyType::Cng => "cng",
            EnergyType::Electric => "electric",
            EnergyType::Unknown => "unknown",
        }
    }
}

impl From<&str> for EnergyType {
    fn from(tag: &str) -> Self {
        EnergyType::from_tag(tag)
    }
}

impl fmt::Display for EnergyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Price Breakup
// =============================================================================

/// Charges that do not depend on price, region or energy type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FixedCharges {
    /// Dealer handling / other charges.
    pub admin: Money,
    /// Lien (hypothecation) registration fee.
    pub lien_registration: Money,
    /// Electronic toll tag fee.
    pub tag_fee: Money,
}

impl FixedCharges {
    /// Sum of all fixed charges.
    pub fn sum(&self) -> Money {
        self.admin + self.lien_registration + self.tag_fee
    }
}

/// An itemized on-road price.
///
/// ## Invariant
/// ```text
/// total == base_price + region_charge + region_safety_charge
///        + insurance_charge + source_tax_charge + fixed_charges.sum()
/// ```
/// Guaranteed by [`crate::breakup::compute_breakup`], which is the only
/// constructor in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakup {
    pub base_price: Money,
    pub region_charge: Money,
    pub region_safety_charge: Money,
    pub insurance_charge: Money,
    pub source_tax_charge: Money,
    pub fixed_charges: FixedCharges,
    pub total: Money,
}

// =============================================================================
// Location Selection
// =============================================================================

/// The user's chosen city and region.
///
/// Persisted as a single string `"City, Region"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LocationSelection {
    pub city: String,
    pub region: String,
}

impl LocationSelection {
    /// Creates a selection from parts.
    pub fn new(city: impl Into<String>, region: impl Into<String>) -> Self {
        LocationSelection {
            city: city.into(),
            region: region.into(),
        }
    }

    /// Parses the persisted `"City, Region"` form.
    ///
    /// Returns `None` when the string is malformed: no comma, or an empty
    /// city or region after trimming. Text after a second comma is ignored
    /// (`"Pune, Maharashtra, India"` → Pune / Maharashtra).
    ///
    /// ## Example
    /// ```rust
    /// use onroad_core::LocationSelection;
    ///
    /// let loc = LocationSelection::parse("Delhi, Delhi").unwrap();
    /// assert_eq!(loc.region, "Delhi");
    /// assert!(LocationSelection::parse("Delhi").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(',');
        let city = parts.next()?.trim();
        let region = parts.next()?.trim();

        if city.is_empty() || region.is_empty() {
            return None;
        }

        Some(LocationSelection::new(city, region))
    }

    /// The `"City, Region"` form written to storage.
    pub fn to_storage_string(&self) -> String {
        format!("{}, {}", self.city, self.region)
    }
}

impl Default for LocationSelection {
    fn default() -> Self {
        LocationSelection::new(DEFAULT_CITY, DEFAULT_REGION)
    }
}

impl fmt::Display for LocationSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.region)
    }
}

// =============================================================================
// Accessor Inputs & Outputs
// =============================================================================

/// Input for a single price lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub base_price: Money,
    pub energy_type: EnergyType,
    /// Also report the region charge in the quote.
    #[serde(default)]
    pub include_breakup: bool,
}

impl PriceRequest {
    pub fn new(base_price: Money, energy_type: impl Into<EnergyType>) -> Self {
        PriceRequest {
            base_price,
            energy_type: energy_type.into(),
            include_breakup: false,
        }
    }

    /// Requests the region charge alongside the total.
    pub fn with_breakup(mut self) -> Self {
        self.include_breakup = true;
        self
    }
}

/// One row of a batch price lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceItem {
    pub id: String,
    pub base_price: Money,
    pub energy_type: EnergyType,
}

impl PriceItem {
    pub fn new(id: impl Into<String>, base_price: Money, energy_type: impl Into<EnergyType>) -> Self {
        PriceItem {
            id: id.into(),
            base_price,
            energy_type: energy_type.into(),
        }
    }
}

/// What a price accessor hands back to a UI consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// On-road total for the resolved region.
    pub total_price: Money,
    pub base_price: Money,
    /// Present only when the request asked for the breakup.
    pub region_charge: Option<Money>,
    pub city: String,
    pub region: String,
    /// `false` while no location has been chosen ("Ex-Showroom" mode).
    pub is_location_set: bool,
}

impl PriceQuote {
    /// The region charge, or zero when it was not requested.
    pub fn breakup_charge_or_zero(&self) -> Money {
        self.region_charge.unwrap_or_default()
    }

    /// "On-Road" or "Ex-Showroom", matching [`Self::is_location_set`].
    pub fn label(&self) -> &'static str {
        crate::format::price_label(self.is_location_set)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
