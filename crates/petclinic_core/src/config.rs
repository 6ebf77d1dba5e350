//! Runtime configuration for clinic hosts.
//!
//! # Responsibility
//! - Resolve database location, surname match mode, seeding and logging
//!   settings from environment variables.
//! - Open a ready-to-use connection according to those settings.
//!
//! # Invariants
//! - Unset variables fall back to defaults; malformed values are errors.

use crate::db::{open_db, open_db_in_memory, seed_sample_data, DbResult};
use crate::logging::{default_log_level, normalize_level};
use crate::repo::clinic_repo::LastNameMatch;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "PETCLINIC_DB_PATH";
pub const ENV_LAST_NAME_MATCH: &str = "PETCLINIC_LAST_NAME_MATCH";
pub const ENV_SEED: &str = "PETCLINIC_SEED";
pub const ENV_LOG_LEVEL: &str = "PETCLINIC_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PETCLINIC_LOG_DIR";

/// Where clinic data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    InMemory,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicConfig {
    pub database: DatabaseLocation,
    pub last_name_match: LastNameMatch,
    /// Load the sample dataset into an empty database on open.
    pub seed_sample_data: bool,
    pub log_level: &'static str,
    /// File logging is enabled only when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::InMemory,
            last_name_match: LastNameMatch::default(),
            seed_sample_data: true,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid value `{value}` for {key}; expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

impl ClinicConfig {
    /// Reads configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let value_of = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(path) = value_of(ENV_DB_PATH) {
            config.database = if path == ":memory:" {
                DatabaseLocation::InMemory
            } else {
                DatabaseLocation::File(PathBuf::from(path))
            };
        }

        if let Some(value) = value_of(ENV_LAST_NAME_MATCH) {
            config.last_name_match =
                LastNameMatch::parse(&value).ok_or(ConfigError::InvalidValue {
                    key: ENV_LAST_NAME_MATCH,
                    value,
                    expected: "prefix|exact|contains",
                })?;
        }

        if let Some(value) = value_of(ENV_SEED) {
            config.seed_sample_data = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                key: ENV_SEED,
                value,
                expected: "true|false|1|0",
            })?;
        }

        if let Some(value) = value_of(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&value).map_err(|_| ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                value,
                expected: "trace|debug|info|warn|error",
            })?;
        }

        if let Some(value) = value_of(ENV_LOG_DIR) {
            let path = PathBuf::from(&value);
            if !path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value,
                    expected: "an absolute path",
                });
            }
            config.log_dir = Some(path);
        }

        Ok(config)
    }

    /// Opens the configured database, seeding it when requested.
    pub fn open_database(&self) -> DbResult<Connection> {
        let mut conn = match &self.database {
            DatabaseLocation::InMemory => open_db_in_memory()?,
            DatabaseLocation::File(path) => open_db(path)?,
        };
        if self.seed_sample_data {
            seed_sample_data(&mut conn)?;
        }
        Ok(conn)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
