//! Schema registry and bootstrap.
//!
//! # Responsibility
//! - Create the `microchip` and `mascota` tables on an empty database.
//! - Refuse to operate on databases written by a newer build.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied version is mirrored to `PRAGMA user_version`.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Creates any missing schema objects on the provided connection.
///
/// Runs in its own short transaction, before any unit of work begins.
pub fn ensure_schema(conn: &mut Connection) -> Result<(), SchemaError> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(SchemaError::UnsupportedVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS {
        if step.version <= current_version {
            continue;
        }

        tx.execute_batch(step.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))?;
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> Result<u32, SchemaError> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
