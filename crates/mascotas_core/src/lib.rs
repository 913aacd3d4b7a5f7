//! Core domain logic for pet and identification chip records.
//! This crate owns the transactional persistence rules; presentation layers
//! only call services.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod uow;

pub use config::{AppConfig, ConfigError, ConfigErrorKind, DatabaseConfig, LoggingConfig};
pub use db::{ConnectionSource, SqliteConnectionProvider};
pub use error::{
    ConnectionError, NotFoundError, PersistenceError, ServiceError, ServiceResult, StoreError,
    StoreResult, ValidationError,
};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError,
};
pub use model::{Chip, ChipId, Pet, PetId};
pub use service::{ChipService, PetService, RecordService};
pub use store::{ChipStore, PetStore, SqliteChipStore, SqlitePetStore, Store};
pub use uow::UnitOfWork;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
