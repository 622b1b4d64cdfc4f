//! # onroad-core: Pure Pricing Logic for onroad
//!
//! This crate is the **heart** of the on-road price engine. It contains the
//! rate table and the breakup calculator as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         onroad Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Consumers (catalog cards, price pages, CLI)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      onroad-engine: PriceCache, LocationContext, accessors      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ onroad-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   rates   │  │  breakup  │  │   │
//! │  │   │ EnergyType│  │   Money   │  │ TaxRate-  │  │ compute_  │  │   │
//! │  │   │  Quote    │  │  portion  │  │  Table    │  │  breakup  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO LOGGING • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (EnergyType, PriceBreakup, LocationSelection, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`rates`] - Region rate table with default fallback
//! - [`breakup`] - The breakup calculator
//! - [`format`] - Display helpers (Indian grouping, lakh)
//! - [`validation`] - Boundary parsing
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use onroad_core::{compute_breakup, EnergyType, Money, TaxRateTable};
//!
//! let table = TaxRateTable::builtin();
//! let breakup = compute_breakup(&table, Money::from_rupees(500_000), "Delhi", EnergyType::from_tag("Diesel"));
//!
//! assert_eq!(breakup.region_charge, Money::from_rupees(60_000));
//! assert_eq!(breakup.total, Money::from_rupees(588_200));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod breakup;
pub mod error;
pub mod format;
pub mod money;
pub mod rates;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use breakup::compute_breakup;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use rates::{TaxRateEntry, TaxRateTable};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// City used while no location has been chosen.
pub const DEFAULT_CITY: &str = "Mumbai";

/// Region used while no location has been chosen, and the rate table's
/// fallback for unknown regions.
pub const DEFAULT_REGION: &str = "Maharashtra";

/// The default selection in its persisted form.
pub const DEFAULT_LOCATION: &str = "Mumbai, Maharashtra";

/// Storage key holding the persisted selection.
pub const LOCATION_STORAGE_KEY: &str = "selectedCity";
