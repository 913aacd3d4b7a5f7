//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open one SQLite connection per request.
//! - Configure connection pragmas required by the stores.
//! - Create the schema before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections are in auto-commit mode.

use super::schema::ensure_schema;
use crate::config::DatabaseSettings;
use crate::error::ConnectionError;
use log::{debug, error};
use rusqlite::Connection;
use std::time::Instant;

/// Opens a SQLite database file described by `settings`.
///
/// # Side effects
/// - Creates the database file and schema when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_connection(settings: &DatabaseSettings) -> Result<Connection, ConnectionError> {
    let started_at = Instant::now();
    debug!("event=db_open module=db status=start");

    let mut conn = match Connection::open(&settings.path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(ConnectionError::Open {
                path: settings.path.clone(),
                source: err,
            });
        }
    };

    match bootstrap_connection(&mut conn, settings) {
        Ok(()) => {
            debug!(
                "event=db_open module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(
    conn: &mut Connection,
    settings: &DatabaseSettings,
) -> Result<(), ConnectionError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(ConnectionError::Configure)?;
    conn.busy_timeout(settings.busy_timeout)
        .map_err(ConnectionError::Configure)?;
    if settings.create_schema {
        ensure_schema(conn)?;
    }
    Ok(())
}
