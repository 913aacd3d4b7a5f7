//! Record store contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the per-entity CRUD contract (`Store<T>`) and entity lookups.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Stores never begin, commit or roll back; they run on the connection
//!   handed to them by the caller's unit of work.
//! - Soft-deleted rows are invisible to every read path.
//! - Deletion only sets the soft-delete flag and is idempotent.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::error::{PersistenceError, StoreResult};
use crate::model::{Chip, Pet};
use rusqlite::{Connection, ErrorCode};

pub mod chip_store;
pub mod pet_store;

pub use chip_store::SqliteChipStore;
pub use pet_store::SqlitePetStore;

/// Uniform CRUD contract over one entity type.
pub trait Store<T> {
    /// Inserts a new row and writes the generated id back onto `record`.
    fn create(&self, record: &mut T, conn: &Connection) -> StoreResult<()>;
    /// Loads one active row by id.
    fn read(&self, id: i64, conn: &Connection) -> StoreResult<Option<T>>;
    /// Loads all active rows in storage order.
    fn read_all(&self, conn: &Connection) -> StoreResult<Vec<T>>;
    /// Overwrites every mutable column of an active row.
    fn update(&self, record: &T, conn: &Connection) -> StoreResult<()>;
    /// Sets the soft-delete flag. Missing ids are not an error.
    fn delete(&self, id: i64, conn: &Connection) -> StoreResult<()>;
}

/// Pet store: CRUD plus name search.
pub trait PetStore: Store<Pet> {
    /// Substring match on pet name, in storage order.
    fn find_by_name(&self, fragment: &str, conn: &Connection) -> StoreResult<Vec<Pet>>;
}

/// Chip store: CRUD plus lookup by unique code.
pub trait ChipStore: Store<Chip> {
    /// Exact match on chip code.
    fn find_by_code(&self, code: &str, conn: &Connection) -> StoreResult<Option<Chip>>;
}

/// Returns the SQLite message when `err` is a constraint violation.
pub(crate) fn constraint_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Some(message.as_deref().unwrap_or(""))
        }
        _ => None,
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_deleted_flag(value: i64, column: &str) -> StoreResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid soft-delete value `{other}` in {column}"
        ))
        .into()),
    }
}

/// Escapes `LIKE` wildcards so `fragment` matches literally.
pub(crate) fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
