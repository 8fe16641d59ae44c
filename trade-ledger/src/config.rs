//! Configuration for the trade ledger

use crate::clock::parse_timezone;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Trade ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// IANA zone `ctime` is rendered in
    pub timezone: String,

    /// Reject status transitions on keys that hold no record
    pub strict_status_transition: bool,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/trade-ledger"),
            service_name: "trade-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            timezone: "America/Los_Angeles".to_string(),
            strict_status_transition: false,
            rocksdb: RocksDBConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML; missing keys keep their defaults
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.timezone()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Apply `TRADE_LEDGER_*` overrides from `lookup` on top of the defaults
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(data_dir) = lookup("TRADE_LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Some(timezone) = lookup("TRADE_LEDGER_TIMEZONE") {
            config.timezone = timezone;
        }

        if let Some(strict) = lookup("TRADE_LEDGER_STRICT_STATUS_TRANSITION") {
            config.strict_status_transition = strict.parse().map_err(|_| {
                crate::Error::Config(format!(
                    "TRADE_LEDGER_STRICT_STATUS_TRANSITION must be true or false, got {:?}",
                    strict
                ))
            })?;
        }

        config.timezone()?;
        Ok(config)
    }

    /// Parsed timezone
    pub fn timezone(&self) -> crate::Result<Tz> {
        parse_timezone(&self.timezone)
    }
}
