//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    999001 × 1 / 100 = 9990.01 (only approximately representable)       │
//! │    Summing seven such charges drifts by a few ULPs per item            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    99900100 paise × 100 bps / 10000 = 999001 paise = ₹9,990.01        │
//! │    Every breakup component is an exact integer, so                     │
//! │    total == sum(components) holds bit-for-bit                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use onroad_core::money::Money;
//!
//! let price = Money::from_rupees(500_000);
//! assert_eq!(price.paise(), 50_000_000);
//!
//! let total = price + Money::from_rupees(4_000);
//! assert_eq!(total.rupees(), 504_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use ts_rs::TS;

use crate::format::group_indian_digits;
use crate::types::TaxRate;

/// Basis points in one whole (100% = 10000 bps).
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of the currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: the calculator applies its formula to any input,
///   negative base prices included
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as paise**: the front end divides by 100 for display
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Variant.base_price ──► compute_breakup ──► PriceBreakup.* (components) │
/// │                              │                                          │
/// │                              └──► PriceBreakup.total ──► PriceCache     │
/// │                                                             │           │
/// │                                          PriceQuote.total_price ◄┘      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use onroad_core::money::Money;
    ///
    /// let tcs = Money::from_paise(999_001); // ₹9,990.01
    /// assert_eq!(tcs.rupees(), 9_990);
    /// assert_eq!(tcs.paise_part(), 1);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Creates a Money value from whole and fractional units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_rupees_paise(-5, 50)` is -₹5.50.
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the fractional portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a chain of rates to this amount and rounds once.
    ///
    /// The rates are multiplied together before dividing, so a charge levied
    /// on another charge (e.g. 2% of a 13% charge) is computed from the exact
    /// intermediate value rather than an already-rounded one.
    ///
    /// ## Rounding
    /// Half-up to the nearest paisa: `(n + d/2) div_euclid d`, using i128 so
    /// no realistic amount overflows. Results beyond `i64` paise saturate.
    ///
    /// ## Example
    /// ```rust
    /// use onroad_core::money::Money;
    /// use onroad_core::types::TaxRate;
    ///
    /// let base = Money::from_rupees(1_000_001);
    /// let charge = base.portion(&[TaxRate::from_bps(1300)]);
    /// assert_eq!(charge.paise(), 13_000_013);
    ///
    /// // 2% of the unrounded charge: 260000.26 paise → 260000
    /// let surcharge = base.portion(&[TaxRate::from_bps(1300), TaxRate::from_bps(200)]);
    /// assert_eq!(surcharge.paise(), 260_000);
    /// ```
    pub fn portion(&self, rates: &[TaxRate]) -> Money {
        let mut numerator = self.0 as i128;
        let mut denominator: i128 = 1;
        for rate in rates {
            numerator = numerator.saturating_mul(rate.bps() as i128);
            denominator = denominator.saturating_mul(BPS_SCALE);
        }
        Money(saturate(div_round_half_up(numerator, denominator)))
    }

    /// Rounds to whole currency units (half-up), for display.
    pub fn round_to_rupees(&self) -> i64 {
        div_round_half_up(self.0 as i128, 100) as i64
    }
}

/// Integer division rounding half toward positive infinity.
pub(crate) fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    numerator.saturating_add(denominator / 2).div_euclid(denominator)
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows `₹` plus Indian digit grouping, e.g. `₹8,70,900.00`.
///
/// ## Note
/// For list views use [`crate::format::format_indian_price`], which rounds
/// to whole units the way catalog cards show prices.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}₹{}.{:02}",
            sign,
            group_indian_digits(self.rupees().unsigned_abs()),
            self.paise_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Saturates at the `i64` paise bounds instead of overflowing.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupees_and_paise() {
        let money = Money::from_rupees(870_900);
        assert_eq!(money.paise(), 87_090_000);
        assert_eq!(money.rupees(), 870_900);
        assert_eq!(money.paise_part(), 0);

        let odd = Money::from_rupees_paise(9_990, 1);
        assert_eq!(odd.paise(), 999_001);

        let negative = Money::from_rupees_paise(-5, 50);
        assert_eq!(negative.paise(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rupees(870_900).to_string(), "₹8,70,900.00");
        assert_eq!(Money::from_paise(999_001).to_string(), "₹9,990.01");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupees(1_000);
        let b = Money::from_rupees(500);

        assert_eq!((a + b).rupees(), 1_500);

        let summed: Money = [a, b, b].into_iter().sum();
        assert_eq!(summed.rupees(), 2_000);
    }

    #[test]
    fn test_portion_single_rate() {
        let base = Money::from_rupees(500_000);
        assert_eq!(base.portion(&[TaxRate::from_bps(1200)]).rupees(), 60_000);
        assert_eq!(base.portion(&[TaxRate::from_bps(460)]).rupees(), 23_000);
    }

    #[test]
    fn test_portion_rounds_half_up_once() {
        // 1 paisa at 50% = 0.5 paise → 1
        assert_eq!(Money::from_paise(1).portion(&[TaxRate::from_bps(5000)]).paise(), 1);
        // 1 paisa at 49.99% → 0
        assert_eq!(Money::from_paise(1).portion(&[TaxRate::from_bps(4999)]).paise(), 0);
        // Negative halves round toward +infinity
        assert_eq!(Money::from_paise(-1).portion(&[TaxRate::from_bps(5000)]).paise(), 0);
    }

    #[test]
    fn test_portion_empty_chain_is_identity() {
        let base = Money::from_paise(12_345);
        assert_eq!(base.portion(&[]), base);
    }

    #[test]
    fn test_round_to_rupees() {
        assert_eq!(Money::from_paise(87_090_049).round_to_rupees(), 870_900);
        assert_eq!(Money::from_paise(87_090_050).round_to_rupees(), 870_901);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_negative());
        assert!(Money::from_paise(-100).is_negative());
    }

    #[test]
    fn test_portion_saturates_instead_of_wrapping() {
        let huge = Money::from_paise(i64::MAX);
        let rate = TaxRate::from_bps(u32::MAX);
        assert_eq!(huge.portion(&[rate, rate, rate]).paise(), i64::MAX);
        assert_eq!(Money::from_paise(i64::MIN).portion(&[rate]).paise(), i64::MIN);
    }

    #[test]
    fn test_add_saturates_at_bounds() {
        let max = Money::from_paise(i64::MAX);
        assert_eq!(max + Money::from_paise(1), max);
        assert_eq!(Money::from_paise(i64::MIN) + Money::from_paise(-1), Money::from_paise(i64::MIN));
    }
}
