//! Connection provider and schema bootstrap entry points.
//!
//! # Responsibility
//! - Turn validated configuration into a provider of fresh connections.
//! - Abstract connection acquisition behind `ConnectionSource` so units of
//!   work do not depend on how connections are made.
//!
//! # Invariants
//! - Every call to `get_connection` returns a new, exclusively owned
//!   connection with `foreign_keys=ON`.
//! - Provider construction fails fast on invalid configuration.

use crate::config::{ConfigError, DatabaseConfig, DatabaseSettings};
use crate::error::ConnectionError;
use rusqlite::Connection;

mod open;
pub mod schema;

pub use open::open_connection;
pub use schema::{ensure_schema, latest_version, SchemaError};

/// Anything able to hand out a new database connection per call.
pub trait ConnectionSource {
    fn get_connection(&self) -> Result<Connection, ConnectionError>;
}

impl<T: ConnectionSource + ?Sized> ConnectionSource for &T {
    fn get_connection(&self) -> Result<Connection, ConnectionError> {
        (**self).get_connection()
    }
}

/// SQLite connection provider built once from process configuration.
#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    settings: DatabaseSettings,
}

impl SqliteConnectionProvider {
    /// Validates configuration and builds the provider.
    ///
    /// # Errors
    /// - `ConfigError::MissingField` / `ConfigError::DriverUnavailable` when
    ///   the `[database]` section is not usable.
    pub fn new(config: &DatabaseConfig) -> Result<Self, ConfigError> {
        let settings = config.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }
}

impl ConnectionSource for SqliteConnectionProvider {
    fn get_connection(&self) -> Result<Connection, ConnectionError> {
        open_connection(&self.settings)
    }
}
