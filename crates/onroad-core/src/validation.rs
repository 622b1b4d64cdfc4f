//! # Validation Module
//!
//! Parsing helpers for outer boundaries (command line, config files).
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI argument / config value                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  THIS MODULE: parse_amount, validate_location                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Money / LocationSelection ──► pricing (accepts anything, never fails)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use onroad_core::validation::{parse_amount, validate_location};
//!
//! assert_eq!(parse_amount("8,70,900.50").unwrap().paise(), 87_090_050);
//! assert!(validate_location("Pune, Maharashtra").is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::LocationSelection;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest accepted magnitude for a parsed amount, in whole rupees.
///
/// Keeps every charge in a breakup well inside `i64` paise.
pub const MAX_AMOUNT_RUPEES: i64 = 1_000_000_000_000;

/// Parses a decimal currency amount into [`Money`].
///
/// ## Rules
/// - Optional leading `-`
/// - Digits with optional `,` or `_` group separators (any grouping)
/// - At most two fractional digits
/// - Magnitude at most [`MAX_AMOUNT_RUPEES`]
/// - No floating point is involved at any step
pub fn parse_amount(text: &str) -> ValidationResult<Money> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "amount".to_string(),
        });
    }

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (unsigned, ""),
    };

    let whole: String = whole.chars().filter(|c| *c != ',' && *c != '_').collect();
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected digits before the decimal point"));
    }
    if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("at most two digits after the decimal point"));
    }

    let out_of_range = || ValidationError::OutOfRange {
        field: "amount".to_string(),
    };
    let rupees: i64 = whole.parse().map_err(|_| out_of_range())?;
    if rupees > MAX_AMOUNT_RUPEES {
        return Err(out_of_range());
    }
    let paise: i64 = format!("{:0<2}", fraction).parse().map_err(|_| out_of_range())?;

    let magnitude = rupees
        .checked_mul(100)
        .and_then(|r| r.checked_add(paise))
        .ok_or_else(out_of_range)?;

    Ok(Money::from_paise(if negative { -magnitude } else { magnitude }))
}

/// Checks that a location string has the `"City, Region"` shape.
pub fn validate_location(text: &str) -> ValidationResult<LocationSelection> {
    if text.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "location".to_string(),
        });
    }

    LocationSelection::parse(text).ok_or_else(|| ValidationError::InvalidFormat {
        field: "location".to_string(),
        reason: "expected \"City, Region\"".to_string(),
    })
}

fn invalid(reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "amount".to_string(),
        reason: reason.to_string(),
    }
}
