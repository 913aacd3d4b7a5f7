//! Process configuration loaded once at entry.
//!
//! # Responsibility
//! - Read the TOML configuration file into an explicit `AppConfig`.
//! - Validate database settings into `DatabaseSettings` for the provider.
//!
//! # Invariants
//! - No configuration is stored in global state; callers pass it by reference.
//! - Startup failures fall into exactly three kinds (see `ConfigErrorKind`).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Only driver bundled into this build.
pub const SQLITE_DRIVER: &str = "sqlite";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Startup failure kinds reported by configuration loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// File missing, unreadable, or not valid TOML.
    Unreadable,
    /// Requested driver is not available in this build.
    DriverUnavailable,
    /// Required field absent or blank.
    MissingField,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load config `{}`: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("database driver `{0}` is not available; expected `sqlite`")]
    DriverUnavailable(String),
    #[error("config field `{0}` must not be blank")]
    MissingField(&'static str),
}

impl ConfigError {
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            Self::Unreadable { .. } => ConfigErrorKind::Unreadable,
            Self::DriverUnavailable(_) => ConfigErrorKind::DriverUnavailable,
            Self::MissingField(_) => ConfigErrorKind::MissingField,
        }
    }
}

/// Top-level configuration file shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[database]` section as written by the operator.
///
/// Fields stay optional here so that a missing value is reported as
/// `ConfigError::MissingField` rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    pub driver: Option<String>,
    pub path: Option<String>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_create_schema")]
    pub create_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: None,
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            create_schema: true,
        }
    }
}

impl DatabaseConfig {
    /// Convenience constructor for a SQLite database file.
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            driver: Some(SQLITE_DRIVER.to_string()),
            path: Some(path.as_ref().display().to_string()),
            ..Self::default()
        }
    }

    /// Checks required fields and driver availability.
    ///
    /// # Errors
    /// - `MissingField` when `driver` or `path` is absent or blank.
    /// - `DriverUnavailable` when `driver` is not `sqlite`.
    pub fn validate(&self) -> Result<DatabaseSettings, ConfigError> {
        let driver = required(self.driver.as_deref(), "database.driver")?;
        if !driver.eq_ignore_ascii_case(SQLITE_DRIVER) {
            return Err(ConfigError::DriverUnavailable(driver.to_string()));
        }
        let path = required(self.path.as_deref(), "database.path")?;

        Ok(DatabaseSettings {
            path: PathBuf::from(path),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            create_schema: self.create_schema,
        })
    }
}

/// Validated database settings consumed by the connection provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub busy_timeout: Duration,
    pub create_schema: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// Absolute directory for rolling log files; stderr when absent.
    pub dir: Option<String>,
}

impl AppConfig {
    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    /// - `ConfigError::Unreadable` when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source: Box::new(err),
        })?;
        Self::from_toml_str(&raw).map_err(|err| match err {
            ConfigError::Unreadable { source, .. } => ConfigError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::Unreadable {
            path: PathBuf::from("<inline>"),
            source: Box::new(err),
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed),
        _ => Err(ConfigError::MissingField(field)),
    }
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_create_schema() -> bool {
    true
}
