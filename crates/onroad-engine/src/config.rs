//! # Pricing Configuration
//!
//! Configuration for the pricing engine and location storage.
//!
//! ## Configuration Sources (in priority order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ONROAD_STORAGE_KEY, ONROAD_DEFAULT_LOCATION, ONROAD_STORAGE_PATH,  │
//! │     ONROAD_CACHE_MAX_ENTRIES, ONROAD_CACHE_TTL_SECS                    │
//! │                                                                         │
//! │  2. Config File (onroad.toml)                                          │
//! │     Location: {config_dir}/onroad/onroad.toml                          │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     key "selectedCity", "Mumbai, Maharashtra", unbounded cache         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [location]
//! storage_key = "selectedCity"
//! default_location = "Mumbai, Maharashtra"
//!
//! [cache]
//! max_entries = 10000
//! ttl_secs = 3600
//!
//! [storage]
//! path = "/var/lib/onroad/storage.json"
//!
//! [[rates]]
//! region = "Goa"
//! petrol = 800
//! diesel = 1000
//! cng = 800
//! electric = 600
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use onroad_core::{
    LocationSelection, TaxRateEntry, TaxRateTable, DEFAULT_LOCATION, LOCATION_STORAGE_KEY,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::CachePolicy;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Location Settings
// =============================================================================

/// Where the selection lives and what applies before one is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSettings {
    /// Key of the persisted `"City, Region"` string.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Selection used while the stored value is absent or malformed.
    #[serde(default = "default_location")]
    pub default_location: String,
}

fn default_storage_key() -> String {
    LOCATION_STORAGE_KEY.to_string()
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            default_location: default_location(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Computation cache bounds. Both absent means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Backing file for the location selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// JSON file path. Falls back to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub location: LocationSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    /// Rate overrides applied on top of the builtin table. New regions are
    /// appended.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rates: Vec<TaxRateEntry>,
}

impl PricingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (onroad.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading pricing config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| EngineError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load pricing config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Pricing config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.location.storage_key.trim().is_empty() {
            return Err(EngineError::InvalidConfig("storage_key must not be empty".into()));
        }

        if LocationSelection::parse(&self.location.default_location).is_none() {
            return Err(EngineError::InvalidConfig(format!(
                "default_location must look like \"City, Region\", got: {:?}",
                self.location.default_location
            )));
        }

        if self.cache.max_entries == Some(0) {
            return Err(EngineError::InvalidConfig(
                "cache.max_entries must be greater than 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.rates {
            let region = entry.region.trim().to_lowercase();
            if region.is_empty() {
                return Err(EngineError::InvalidConfig("rate entry with empty region".into()));
            }
            if !seen.insert(region) {
                return Err(EngineError::InvalidConfig(format!(
                    "duplicate rate entry for region: {}",
                    entry.region
                )));
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Applies overrides from an arbitrary variable source.
    ///
    /// Unparseable numeric values are logged and ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("ONROAD_STORAGE_KEY") {
            debug!(key = %key, "Overriding storage key from environment");
            self.location.storage_key = key;
        }

        if let Some(location) = lookup("ONROAD_DEFAULT_LOCATION") {
            debug!(location = %location, "Overriding default location from environment");
            self.location.default_location = location;
        }

        if let Some(max) = lookup("ONROAD_CACHE_MAX_ENTRIES") {
            match max.parse::<usize>() {
                Ok(n) => self.cache.max_entries = Some(n),
                Err(_) => warn!(value = %max, "Ignoring invalid ONROAD_CACHE_MAX_ENTRIES"),
            }
        }

        if let Some(ttl) = lookup("ONROAD_CACHE_TTL_SECS") {
            match ttl.parse::<u64>() {
                Ok(secs) => self.cache.ttl_secs = Some(secs),
                Err(_) => warn!(value = %ttl, "Ignoring invalid ONROAD_CACHE_TTL_SECS"),
            }
        }

        if let Some(path) = lookup("ONROAD_STORAGE_PATH") {
            debug!(path = %path, "Overriding storage path from environment");
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("onroad.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The default selection. Falls back to the builtin default if the
    /// configured string is malformed (only possible without `validate`).
    pub fn default_selection(&self) -> LocationSelection {
        LocationSelection::parse(&self.location.default_location).unwrap_or_default()
    }

    /// Builtin rate table with the configured overrides applied.
    pub fn rate_table(&self) -> TaxRateTable {
        TaxRateTable::builtin().with_overrides(self.rates.iter().cloned())
    }

    pub fn cache_policy(&self) -> CachePolicy {
        let mut policy = match self.cache.max_entries {
            Some(max) => CachePolicy::bounded(max),
            None => CachePolicy::unbounded(),
        };
        if let Some(secs) = self.cache.ttl_secs {
            policy = policy.with_ttl(Duration::from_secs(secs));
        }
        policy
    }

    /// Configured storage file, or `storage.json` in the platform data dir.
    pub fn storage_path(&self) -> Option<PathBuf> {
        self.storage
            .path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("storage.json")))
    }

    pub fn storage_key(&self) -> &str {
        &self.location.storage_key
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "onroad", "onroad")
}

/// Reads a config file without consulting the environment.
pub fn read_config_file(path: &Path) -> EngineResult<PricingConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| EngineError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;
    Ok(toml::from_str(&contents)?)
}
