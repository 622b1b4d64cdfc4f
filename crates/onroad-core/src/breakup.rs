//! # Breakup Calculator
//!
//! Turns a base price, a region and an energy type into an itemized
//! on-road price.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base_price ──┬──► × region rate ───────────► region_charge             │
//! │               │        └──► × 2% ───────────► region_safety_charge      │
//! │               ├──► × 4.6% ──────────────────► insurance_charge          │
//! │               ├──► > ₹9,99,000 ? × 1% : 0 ──► source_tax_charge         │
//! │               │                                                         │
//! │               │    admin 2000 + lien 1500 + tag 500 ► fixed_charges     │
//! │               ▼                                                         │
//! │  total = base + every charge above                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator does not validate its input. A zero or negative base price
//! goes through the same formula; rejecting such prices is the caller's job.

use crate::money::Money;
use crate::rates::TaxRateTable;
use crate::types::{EnergyType, FixedCharges, PriceBreakup, TaxRate};

/// Surcharge levied on the region charge (2%).
pub const REGION_SAFETY_RATE: TaxRate = TaxRate::from_bps(200);

/// Insurance as a share of the base price (4.6%).
pub const INSURANCE_RATE: TaxRate = TaxRate::from_bps(460);

/// Source tax rate once the threshold is exceeded (1%).
pub const SOURCE_TAX_RATE: TaxRate = TaxRate::from_bps(100);

/// Source tax applies strictly above this base price.
pub const SOURCE_TAX_THRESHOLD: Money = Money::from_rupees(999_000);

/// Fixed charges added to every breakup.
pub const FIXED_CHARGES: FixedCharges = FixedCharges {
    admin: Money::from_rupees(2_000),
    lien_registration: Money::from_rupees(1_500),
    tag_fee: Money::from_rupees(500),
};

/// Computes the full breakup.
///
/// Each derived charge is rounded once, half-up to the paisa, from the exact
/// value of its formula; `total` is the exact sum of the rounded parts.
///
/// ## Example
/// ```rust
/// use onroad_core::{compute_breakup, EnergyType, Money, TaxRateTable};
///
/// let table = TaxRateTable::builtin();
/// let breakup = compute_breakup(&table, Money::from_rupees(1_000_000), "Maharashtra", EnergyType::Petrol);
///
/// assert_eq!(breakup.region_charge, Money::from_rupees(130_000));
/// assert_eq!(breakup.total, Money::from_rupees(1_192_600));
/// ```
pub fn compute_breakup(
    table: &TaxRateTable,
    base_price: Money,
    region: &str,
    energy: EnergyType,
) -> PriceBreakup {
    let region_rate = table.percentage_for(region, energy);

    let region_charge = base_price.portion(&[region_rate]);
    let region_safety_charge = base_price.portion(&[region_rate, REGION_SAFETY_RATE]);
    let insurance_charge = base_price.portion(&[INSURANCE_RATE]);
    let source_tax_charge = source_tax(base_price);
    let fixed_charges = FIXED_CHARGES;

    let total = base_price
        + region_charge
        + region_safety_charge
        + insurance_charge
        + source_tax_charge
        + fixed_charges.sum();

    PriceBreakup {
        base_price,
        region_charge,
        region_safety_charge,
        insurance_charge,
        source_tax_charge,
        fixed_charges,
        total,
    }
}

/// Only the region charge, for quotes that show it next to the total.
pub fn region_charge(table: &TaxRateTable, base_price: Money, region: &str, energy: EnergyType) -> Money {
    base_price.portion(&[table.percentage_for(region, energy)])
}

fn source_tax(base_price: Money) -> Money {
    if base_price > SOURCE_TAX_THRESHOLD {
        base_price.portion(&[SOURCE_TAX_RATE])
    } else {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TaxRateTable {
        TaxRateTable::builtin()
    }

    fn assert_decomposes(b: &PriceBreakup) {
        assert_eq!(
            b.total,
            b.base_price
                + b.region_charge
                + b.region_safety_charge
                + b.insurance_charge
                + b.source_tax_charge
                + Money::from_rupees(4_000)
        );
    }

    #[test]
    fn test_maharashtra_petrol_above_threshold() {
        let b = compute_breakup(&table(), Money::from_rupees(1_000_000), "Maharashtra", EnergyType::Petrol);
        assert_eq!(b.region_charge, Money::from_rupees(130_000));
        assert_eq!(b.region_safety_charge, Money::from_rupees(2_600));
        assert_eq!(b.insurance_charge, Money::from_rupees(46_000));
        assert_eq!(b.source_tax_charge, Money::from_rupees(10_000));
        assert_eq!(b.fixed_charges.sum(), Money::from_rupees(4_000));
        assert_eq!(b.total, Money::from_rupees(1_192_600));
    }

    #[test]
    fn test_delhi_diesel_below_threshold() {
        let b = compute_breakup(&table(), Money::from_rupees(500_000), "Delhi", EnergyType::Diesel);
        assert_eq!(b.region_charge, Money::from_rupees(60_000));
        assert_eq!(b.region_safety_charge, Money::from_rupees(1_200));
        assert_eq!(b.insurance_charge, Money::from_rupees(23_000));
        assert!(b.source_tax_charge.is_zero());
        assert_eq!(b.total, Money::from_rupees(588_200));
    }

    #[test]
    fn test_source_tax_threshold_is_exclusive() {
        let at = compute_breakup(&table(), Money::from_rupees(999_000), "Maharashtra", EnergyType::Petrol);
        assert!(at.source_tax_charge.is_zero());

        let above = compute_breakup(&table(), Money::from_rupees(999_001), "Maharashtra", EnergyType::Petrol);
        assert_eq!(above.source_tax_charge, Money::from_rupees_paise(9_990, 1));
    }

    #[test]
    fn test_fixed_charges() {
        let b = compute_breakup(&table(), Money::from_rupees(700_000), "Goa", EnergyType::Cng);
        assert_eq!(b.fixed_charges.admin, Money::from_rupees(2_000));
        assert_eq!(b.fixed_charges.lien_registration, Money::from_rupees(1_500));
        assert_eq!(b.fixed_charges.tag_fee, Money::from_rupees(500));
    }

    #[test]
    fn test_total_decomposition_holds_across_inputs() {
        let table = table();
        let regions = ["Maharashtra", "Delhi", "Kerala", "Atlantis"];
        let energies = [EnergyType::Petrol, EnergyType::Diesel, EnergyType::Cng, EnergyType::Electric, EnergyType::Unknown];
        let prices = [0, 1, 333_333, 999_000, 999_001, 1_234_567, 45_000_000];

        for region in regions {
            for energy in energies {
                for rupees in prices {
                    let b = compute_breakup(&table, Money::from_paise(rupees * 100 + 37), region, energy);
                    assert_decomposes(&b);
                }
            }
        }
    }

    #[test]
    fn test_monotonic_in_base_price() {
        let table = table();
        let mut previous = compute_breakup(&table, Money::zero(), "Karnataka", EnergyType::Diesel).total;
        // Step through the source-tax threshold in coarse and fine steps
        let steps = (0..=2_000_000).step_by(12_345).chain(998_990..=999_010);
        let mut prices: Vec<i64> = steps.collect();
        prices.sort_unstable();

        for rupees in prices {
            let total = compute_breakup(&table, Money::from_rupees(rupees), "Karnataka", EnergyType::Diesel).total;
            assert!(total >= previous, "total dropped at {}", rupees);
            previous = total;
        }
    }

    #[test]
    fn test_zero_base_price_is_fixed_charges_only() {
        let b = compute_breakup(&table(), Money::zero(), "Delhi", EnergyType::Petrol);
        assert_eq!(b.total, Money::from_rupees(4_000));
    }

    #[test]
    fn test_negative_base_price_is_not_rejected() {
        let b = compute_breakup(&table(), Money::from_rupees(-100_000), "Delhi", EnergyType::Petrol);
        assert_eq!(b.region_charge, Money::from_rupees(-10_000));
        assert!(b.source_tax_charge.is_zero());
        assert_decomposes(&b);
    }

    #[test]
    fn test_safety_charge_uses_unrounded_region_charge() {
        // 13% of ₹1,000,001 = ₹130,000.13; 2% of that = ₹2,600.0026 → ₹2,600.00
        let b = compute_breakup(&table(), Money::from_rupees(1_000_001), "Maharashtra", EnergyType::Petrol);
        assert_eq!(b.region_charge, Money::from_rupees_paise(130_000, 13));
        assert_eq!(b.region_safety_charge, Money::from_rupees(2_600));
    }

    #[test]
    fn test_region_charge_helper_matches_breakup() {
        let table = table();
        let base = Money::from_rupees(845_500);
        let b = compute_breakup(&table, base, "Tamil Nadu", EnergyType::Electric);
        assert_eq!(region_charge(&table, base, "Tamil Nadu", EnergyType::Electric), b.region_charge);
    }

    #[test]
    fn test_largest_parsed_amount_decomposes() {
        let base = crate::validation::parse_amount("10,00,00,00,00,000").unwrap();
        let b = compute_breakup(&table(), base, "Maharashtra", EnergyType::Diesel);
        assert_eq!(b.region_charge, Money::from_rupees(150_000_000_000));
        assert_decomposes(&b);
    }

    #[test]
    fn test_extreme_base_price_saturates() {
        let b = compute_breakup(&table(), Money::from_paise(i64::MAX), "Delhi", EnergyType::Petrol);
        assert_eq!(b.total, Money::from_paise(i64::MAX));
    }
}
