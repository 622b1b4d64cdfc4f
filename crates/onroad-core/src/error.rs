//! # Error Types
//!
//! Domain-specific error types for onroad-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  onroad-core errors (this file)                                        │
//! │  ├── CoreError        - Rate table construction failures               │
//! │  └── ValidationError  - Boundary input parse failures                  │
//! │                                                                         │
//! │  onroad-engine errors (separate crate)                                 │
//! │  └── EngineError      - Config, storage and serialization failures     │
//! │                                                                         │
//! │  Pricing itself never errors: lookups and the breakup calculator       │
//! │  substitute defaults instead.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while assembling domain data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two rate entries share a region name (case-insensitive).
    #[error("Duplicate rate entry for region: {0}")]
    DuplicateRegion(String),

    /// The requested fallback region has no entry in the table.
    #[error("Default region has no rate entry: {0}")]
    UnknownDefaultRegion(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Only raised by the boundary helpers in [`crate::validation`]; the pricing
/// path accepts any input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g. a non-numeric amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value does not fit the target type.
    #[error("{field} is out of range")]
    OutOfRange { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DuplicateRegion("Goa".to_string());
        assert_eq!(err.to_string(), "Duplicate rate entry for region: Goa");

        let err = ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "expected digits".to_string(),
        };
        assert_eq!(err.to_string(), "price has invalid format: expected digits");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "location".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
