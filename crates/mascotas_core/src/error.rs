//! Error taxonomy shared by stores, units of work and services.
//!
//! # Responsibility
//! - Name the four failure families callers must tell apart: validation,
//!   not-found, connection and persistence.
//! - Provide the layered wrappers (`StoreError`, `ServiceError`) with `From`
//!   conversions so `?` carries failures upward unchanged.
//!
//! # Invariants
//! - `ValidationError` is only produced before a unit of work is opened.
//! - Rollback and teardown failures never appear in this taxonomy.

use crate::config::ConfigError;
use crate::db::SchemaError;
use crate::model::{ChipId, PetId};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Input rejected by business rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pet name must not be blank")]
    BlankPetName,
    #[error("pet species must not be blank")]
    BlankSpecies,
    #[error("pet owner name must not be blank")]
    BlankOwner,
    #[error("chip code must not be blank")]
    BlankChipCode,
    #[error("chip clinic must not be blank")]
    BlankClinic,
    /// Update requested for a record that was never persisted.
    #[error("{entity} id is required for update")]
    MissingId { entity: &'static str },
}

/// Target of an update or association does not exist (or is soft-deleted).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("pet not found: {0}")]
    Pet(PetId),
    #[error("chip not found: {0}")]
    Chip(ChipId),
    #[error("chip not found for code `{0}`")]
    ChipCode(String),
}

/// A connection could not be obtained or prepared for a unit of work.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid connection configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot open database `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("cannot configure connection: {0}")]
    Configure(#[source] rusqlite::Error),
    #[error("cannot prepare schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("cannot start transaction: {0}")]
    BeginTransaction(#[source] rusqlite::Error),
}

/// Storage-layer failure.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("insert into `{table}` returned no generated id")]
    MissingGeneratedKey { table: &'static str },
    #[error("`{table}` record has no id")]
    MissingIdentity { table: &'static str },
    /// Pet references a chip that has not been persisted yet.
    #[error("pet references chip `{code}` which has no id yet")]
    UnsavedChipReference { code: String },
    #[error("chip code `{code}` already exists")]
    DuplicateChipCode { code: String },
    #[error("chip {chip_id} is already assigned to another pet")]
    ChipAlreadyAssigned { chip_id: ChipId },
    #[error("pet references chip {chip_id} which does not exist")]
    DanglingChipReference { chip_id: ChipId },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("commit failed: {0}")]
    Commit(#[source] rusqlite::Error),
}

/// Error returned by `Store` implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(PersistenceError::Sqlite(value))
    }
}

/// Error returned by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(err) => Self::NotFound(err),
            StoreError::Persistence(err) => Self::Persistence(err),
        }
    }
}

impl ServiceError {
    /// Short stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Connection(_) => "connection",
            Self::Persistence(_) => "persistence",
        }
    }
}
