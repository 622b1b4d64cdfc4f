//! # Price Formatting
//!
//! Display helpers for catalog cards and price pages.
//!
//! ```text
//!   format_indian_price(₹8,70,900.40) → "8,70,900"
//!   format_lakh_price(₹8,70,900.40)   → "8.71 Lakh"
//!   price_label(true)                 → "On-Road"
//! ```

use crate::money::{div_round_half_up, Money};

/// Paise in one lakh (1,00,000 units).
const PAISE_PER_LAKH: i128 = 10_000_000;

/// Groups digits the Indian way: last three, then pairs (`12,34,567`).
pub fn group_indian_digits(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Whole-unit price with Indian grouping, rounded half-up.
///
/// ## Example
/// ```rust
/// use onroad_core::format::format_indian_price;
/// use onroad_core::Money;
///
/// assert_eq!(format_indian_price(Money::from_rupees(870_900)), "8,70,900");
/// assert_eq!(format_indian_price(Money::from_paise(99_950)), "1,000");
/// ```
pub fn format_indian_price(price: Money) -> String {
    let rupees = price.round_to_rupees();
    let sign = if rupees < 0 { "-" } else { "" };
    format!("{}{}", sign, group_indian_digits(rupees.unsigned_abs()))
}

/// Price in lakh with two decimals, e.g. `"8.71 Lakh"`.
pub fn format_lakh_price(price: Money) -> String {
    let hundredths = div_round_half_up(price.paise() as i128 * 100, PAISE_PER_LAKH);
    let sign = if hundredths < 0 { "-" } else { "" };
    let hundredths = hundredths.unsigned_abs();
    format!("{}{}.{:02} Lakh", sign, hundredths / 100, hundredths % 100)
}

/// Heading shown next to a price.
pub fn price_label(is_location_set: bool) -> &'static str {
    if is_location_set {
        "On-Road"
    } else {
        "Ex-Showroom"
    }
}
