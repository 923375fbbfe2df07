//! Node configuration
//!
//! Loaded from an optional TOML file named by `ORACLE_CONFIG`, then
//! overridden field by field from `ORACLE_*` environment variables.
//!
//! # Config File Format
//!
//! ```toml
//! [storage]
//! path = "./data/oracle"
//! sync_writes = true
//!
//! [beacon]
//! epochs_per_frame = 225
//! slots_per_epoch = 32
//! seconds_per_slot = 12
//! genesis_time = 1606824023
//!
//! [oracle]
//! members = ["0x00000000000000000000000000000000000000aa"]
//! quorum = 1
//! event_capacity = 1024
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use qc_18_beacon_oracle::{BeaconSpec, MemberAddress, OracleConfig, OracleError, MAX_MEMBERS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid member address {value:?}: {reason}")]
    InvalidMember { value: String, reason: String },

    #[error("Too many members: {count} (at most {max})")]
    TooManyMembers { count: usize, max: usize },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// RocksDB directory
    pub path: String,
    /// fsync every snapshot write
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./data/oracle".to_string(),
            sync_writes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembersConfig {
    /// `0x`-prefixed member addresses, only used on first boot
    pub members: Vec<String>,
    pub quorum: u32,
    pub event_capacity: usize,
}

impl Default for MembersConfig {
    fn default() -> Self {
        let defaults = OracleConfig::default();
        Self {
            members: Vec::new(),
            quorum: defaults.quorum,
            event_capacity: defaults.event_capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleNodeConfig {
    pub storage: StorageConfig,
    pub beacon: BeaconSpec,
    pub oracle: MembersConfig,
    pub logging: LoggingConfig,
}

impl OracleNodeConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load_with(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` for environment variables
    ///
    /// # Environment Variables
    ///
    /// - `ORACLE_CONFIG`: TOML file to start from (default: built-in defaults)
    /// - `ORACLE_STORAGE_PATH`, `ORACLE_SYNC_WRITES`
    /// - `ORACLE_EPOCHS_PER_FRAME`, `ORACLE_SLOTS_PER_EPOCH`,
    ///   `ORACLE_SECONDS_PER_SLOT`, `ORACLE_GENESIS_TIME`
    /// - `ORACLE_MEMBERS`: comma separated addresses
    /// - `ORACLE_QUORUM`
    /// - `ORACLE_LOG_LEVEL`, `ORACLE_JSON_LOGS`
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("ORACLE_CONFIG") {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = lookup("ORACLE_STORAGE_PATH") {
            self.storage.path = path;
        }
        override_parsed(lookup, "ORACLE_SYNC_WRITES", &mut self.storage.sync_writes)?;

        override_parsed(lookup, "ORACLE_EPOCHS_PER_FRAME", &mut self.beacon.epochs_per_frame)?;
        override_parsed(lookup, "ORACLE_SLOTS_PER_EPOCH", &mut self.beacon.slots_per_epoch)?;
        override_parsed(lookup, "ORACLE_SECONDS_PER_SLOT", &mut self.beacon.seconds_per_slot)?;
        override_parsed(lookup, "ORACLE_GENESIS_TIME", &mut self.beacon.genesis_time)?;

        if let Some(members) = lookup("ORACLE_MEMBERS") {
            self.oracle.members = members
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        override_parsed(lookup, "ORACLE_QUORUM", &mut self.oracle.quorum)?;

        if let Some(level) = lookup("ORACLE_LOG_LEVEL") {
            self.logging.level = level;
        }
        override_parsed(lookup, "ORACLE_JSON_LOGS", &mut self.logging.json)?;
        Ok(())
    }

    /// Reject configurations the oracle would refuse to start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_oracle_config()?.membership()?;
        Ok(())
    }

    /// Seed configuration for the oracle service
    pub fn to_oracle_config(&self) -> Result<OracleConfig, ConfigError> {
        if self.oracle.members.len() > MAX_MEMBERS {
            return Err(ConfigError::TooManyMembers {
                count: self.oracle.members.len(),
                max: MAX_MEMBERS,
            });
        }
        let members = self
            .oracle
            .members
            .iter()
            .map(|value| {
                value
                    .parse::<MemberAddress>()
                    .map_err(|e| ConfigError::InvalidMember {
                        value: value.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OracleConfig {
            spec: self.beacon,
            members,
            quorum: self.oracle.quorum,
            event_capacity: self.oracle.event_capacity,
        })
    }
}

fn override_parsed<V: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut V,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(var) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { var, value })?;
    }
    Ok(())
}
