//! # Engine Error Types
//!
//! Error types for configuration and storage operations.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Storage      │  │     Domain              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  StorageFailed  │  │  Core (rate table)      │ │
//! │  │  ConfigLoad...  │  │  Serialization  │  │  Validation             │ │
//! │  │  ConfigSave...  │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Price accessors never return these: storage failures are logged and   │
//! │  the default location is used instead.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use onroad_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// The key-value backend could not be read or written.
    #[error("Storage error: {0}")]
    StorageFailed(String),

    /// Stored data could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Rate table construction failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Boundary input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::StorageFailed(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::ConfigSaveFailed(err.to_string())
    }
}

impl EngineError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig(_)
                | EngineError::ConfigLoadFailed(_)
                | EngineError::ConfigSaveFailed(_)
                | EngineError::Core(_)
        )
    }
}
