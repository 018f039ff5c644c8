//! Application configuration loading from config.toml
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! A file that exists but does not parse is a configuration error.

use crate::errors::{Error, Result};
use chrono::TimeDelta;
use serde::Deserialize;
use std::env::VarError;
use std::path::Path;
use tracing::{debug, error, info};

/// Environment variable naming the config file path
pub const CONFIG_PATH_ENV: &str = "STOCK_LEDGER_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sheet naming and defaults
    pub ledger: LedgerConfig,
    /// Location lock settings
    pub locks: LockConfig,
    /// Sheet listing cache settings
    pub cache: CacheConfig,
}

/// Sheet naming and product defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Title of the master product sheet used as the count template
    pub master_sheet: String,
    /// Prefix of dated count sheets; the date follows after a space
    pub snapshot_prefix: String,
    /// Unit shown for products whose unit cell is blank
    pub default_unit: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            master_sheet: "Лист1".to_string(),
            snapshot_prefix: "Інвентаризація".to_string(),
            default_unit: "кг".to_string(),
        }
    }
}

/// Location lock settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Minutes before an untouched location lock expires
    pub timeout_minutes: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: 30,
        }
    }
}

impl LockConfig {
    /// Lock lifetime as a duration.
    #[must_use]
    pub fn timeout(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.timeout_minutes))
    }
}

/// Sheet listing cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a cached sheet listing stays valid
    pub ttl_seconds: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 60 }
    }
}

impl CacheConfig {
    /// Cache lifetime as a duration.
    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.ttl_seconds))
    }
}

impl AppConfig {
    fn validate(self) -> Result<Self> {
        if self.ledger.master_sheet.trim().is_empty() {
            return Err(Error::Config {
                message: "ledger.master_sheet cannot be empty".to_string(),
            });
        }
        if self.locks.timeout_minutes == 0 {
            return Err(Error::Config {
                message: "locks.timeout_minutes must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value is out of range.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()
}

/// Loads configuration from a TOML file. A missing file yields the defaults.
///
/// # Errors
/// Returns [`Error::Io`] if the file exists but cannot be read, and
/// [`Error::Config`] if it cannot be parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No config file at {path:?}, using defaults");
        return Ok(AppConfig::default());
    }

    debug!("Loading configuration from {path:?}");
    let contents = std::fs::read_to_string(path)
        .inspect_err(|e| error!("Failed to read config file {path:?}: {e}"))?;
    parse_config(&contents)
}

/// Loads configuration from `STOCK_LEDGER_CONFIG`, or ./config.toml when unset.
///
/// # Errors
/// Returns [`Error::EnvVar`] if `STOCK_LEDGER_CONFIG` is set but not valid
/// Unicode, otherwise the errors of [`load_config`].
pub fn load_default_config() -> Result<AppConfig> {
    let path = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => path,
        Err(VarError::NotPresent) => "config.toml".to_string(),
        Err(e) => return Err(e.into()),
    };
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [ledger]
            master_sheet = "Products"
            snapshot_prefix = "Count"
            default_unit = "kg"

            [locks]
            timeout_minutes = 15

            [cache]
            ttl_seconds = 5
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.ledger.master_sheet, "Products");
        assert_eq!(config.ledger.snapshot_prefix, "Count");
        assert_eq!(config.ledger.default_unit, "kg");
        assert_eq!(config.locks.timeout(), TimeDelta::minutes(15));
        assert_eq!(config.cache.ttl(), TimeDelta::seconds(5));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config("[locks]\ntimeout_minutes = 45\n").unwrap();
        assert_eq!(config.ledger.master_sheet, "Лист1");
        assert_eq!(config.ledger.default_unit, "кг");
        assert_eq!(config.locks.timeout_minutes, 45);
        assert_eq!(config.cache.ttl_seconds, 60);
    }

    #[test]
    fn test_zero_lock_timeout_is_rejected() {
        let result = parse_config("[locks]\ntimeout_minutes = 0\n");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("[ledger\nmaster_sheet = ");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }

    #[test]
    fn test_unreadable_config_path_is_io_error() {
        // A directory exists but cannot be read as a file
        let dir = std::env::temp_dir();
        let result = load_config(&dir);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config("does/not/exist/config.toml").unwrap();
        assert_eq!(config.locks.timeout_minutes, 30);
    }
}
