//! Core use-case services.
//!
//! # Responsibility
//! - Validate input before any persistence work starts.
//! - Bind store calls into units of work, one unit per public operation.
//! - Keep presentation layers decoupled from storage details.
//!
//! # Invariants
//! - A `ValidationError` is returned before a connection is requested.
//! - Services never touch SQL; they only call `Store` implementations.

use crate::error::ServiceResult;

pub mod chip_service;
pub mod pet_service;

pub use chip_service::ChipService;
pub use pet_service::PetService;

/// Service-level CRUD contract shared by pet and chip services.
pub trait RecordService<T> {
    /// Validates and persists a new record, writing its id back.
    fn insert(&self, record: &mut T) -> ServiceResult<()>;
    /// Validates and overwrites a persisted record.
    fn update(&self, record: &T) -> ServiceResult<()>;
    /// Soft-deletes by id.
    fn delete(&self, id: i64) -> ServiceResult<()>;
    fn get_by_id(&self, id: i64) -> ServiceResult<Option<T>>;
    fn get_all(&self) -> ServiceResult<Vec<T>>;
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
