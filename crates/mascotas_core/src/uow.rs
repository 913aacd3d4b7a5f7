//! Unit of work: one connection, one transaction.
//!
//! # Responsibility
//! - Acquire a connection and start a transaction on it.
//! - Expose that single connection to every store call in the unit.
//! - Commit, or roll back without surfacing rollback failures.
//! - Release the connection on every exit path via `Drop`.
//!
//! # Invariants
//! - The connection is owned by exactly one unit and never handed out by
//!   value.
//! - `Drop` never commits and never panics; teardown failures are logged and
//!   swallowed so they cannot mask the outcome the caller already has.
//! - An open transaction left at drop time is ended without persisting
//!   anything (SQLite returns to auto-commit by discarding it).
//!
//! # See also
//! - `UnitOfWork::transact` for the guarded commit/rollback pattern used by
//!   services.

use crate::db::ConnectionSource;
use crate::error::{ConnectionError, PersistenceError, ServiceResult};
use log::{debug, error, warn};
use rusqlite::Connection;
use std::time::Instant;
use uuid::Uuid;

/// Transactional scope over one exclusively owned connection.
pub struct UnitOfWork {
    id: Uuid,
    conn: Option<Connection>,
    read_only: bool,
    started_at: Instant,
}

impl UnitOfWork {
    /// Acquires a connection and disables auto-commit (`BEGIN DEFERRED`).
    ///
    /// # Errors
    /// - `ConnectionError` when no connection can be obtained or the
    ///   transaction cannot be started. In the latter case the connection is
    ///   closed before returning.
    pub fn open<S: ConnectionSource + ?Sized>(source: &S) -> Result<Self, ConnectionError> {
        Self::begin(source, false)
    }

    /// Same as `open`, for units that only read.
    ///
    /// Read-only units are ended by `Drop` without an explicit commit.
    pub fn open_read_only<S: ConnectionSource + ?Sized>(
        source: &S,
    ) -> Result<Self, ConnectionError> {
        Self::begin(source, true)
    }

    fn begin<S: ConnectionSource + ?Sized>(
        source: &S,
        read_only: bool,
    ) -> Result<Self, ConnectionError> {
        let id = Uuid::new_v4();
        let started_at = Instant::now();

        let conn = source.get_connection().map_err(|err| {
            error!(
                "event=uow_open module=uow status=error uow_id={} error_code=connection_unavailable error={}",
                id, err
            );
            err
        })?;

        if let Err(err) = conn.execute_batch("BEGIN DEFERRED;") {
            error!(
                "event=uow_open module=uow status=error uow_id={} error_code=begin_failed error={}",
                id, err
            );
            close_connection(id, conn);
            return Err(ConnectionError::BeginTransaction(err));
        }

        debug!(
            "event=uow_open module=uow status=ok uow_id={} read_only={}",
            id, read_only
        );
        Ok(Self {
            id,
            conn: Some(conn),
            read_only,
            started_at,
        })
    }

    /// Log correlation id of this unit.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The connection every store call in this unit must use.
    pub fn connection(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("unit of work connection is only released on drop")
    }

    /// Whether a transaction is currently open on the connection.
    pub fn in_transaction(&self) -> bool {
        !self.connection().is_autocommit()
    }

    /// Commits the transaction.
    ///
    /// # Errors
    /// - `PersistenceError::Commit` when the commit fails. The transaction
    ///   stays open; the caller decides whether to roll back.
    pub fn commit(&self) -> Result<(), PersistenceError> {
        match self.connection().execute_batch("COMMIT;") {
            Ok(()) => {
                debug!(
                    "event=uow_commit module=uow status=ok uow_id={} duration_ms={}",
                    self.id,
                    self.started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=uow_commit module=uow status=error uow_id={} error_code=commit_failed error={}",
                    self.id, err
                );
                Err(PersistenceError::Commit(err))
            }
        }
    }

    /// Rolls back the transaction, ignoring any failure.
    pub fn rollback_silently(&self) {
        let conn = self.connection();
        if conn.is_autocommit() {
            return;
        }
        match conn.execute_batch("ROLLBACK;") {
            Ok(()) => debug!(
                "event=uow_rollback module=uow status=ok uow_id={}",
                self.id
            ),
            Err(err) => warn!(
                "event=uow_rollback module=uow status=error uow_id={} error={}",
                self.id, err
            ),
        }
    }

    /// Runs `work` in a fresh unit and commits when it succeeds.
    ///
    /// Any failure after the unit is open, including a failed commit, rolls
    /// the transaction back before the connection is released.
    pub fn transact<S, T, F>(source: &S, work: F) -> ServiceResult<T>
    where
        S: ConnectionSource + ?Sized,
        F: FnOnce(&Connection) -> ServiceResult<T>,
    {
        let uow = Self::open(source)?;
        let outcome = work(uow.connection()).and_then(|value| {
            uow.commit()?;
            Ok(value)
        });
        if let Err(err) = &outcome {
            warn!(
                "event=uow_abort module=uow status=rolled_back uow_id={} error_code={}",
                uow.id,
                err.code()
            );
            uow.rollback_silently();
        }
        outcome
    }

    /// Runs read-only `work` in a fresh unit; nothing is committed.
    pub fn read<S, T, F>(source: &S, work: F) -> ServiceResult<T>
    where
        S: ConnectionSource + ?Sized,
        F: FnOnce(&Connection) -> ServiceResult<T>,
    {
        let uow = Self::open_read_only(source)?;
        let outcome = work(uow.connection());
        if outcome.is_err() {
            uow.rollback_silently();
        }
        outcome
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        if !conn.is_autocommit() {
            if !self.read_only {
                warn!(
                    "event=uow_close module=uow status=uncommitted uow_id={}",
                    self.id
                );
            }
            if let Err(err) = conn.execute_batch("ROLLBACK;") {
                warn!(
                    "event=uow_close module=uow status=error uow_id={} error_code=restore_autocommit_failed error={}",
                    self.id, err
                );
            }
        }

        close_connection(self.id, conn);
        debug!(
            "event=uow_close module=uow status=ok uow_id={} duration_ms={}",
            self.id,
            self.started_at.elapsed().as_millis()
        );
    }
}

fn close_connection(id: Uuid, conn: Connection) {
    if let Err((conn, err)) = conn.close() {
        warn!(
            "event=uow_close module=uow status=error uow_id={} error_code=close_failed error={}",
            id, err
        );
        // The destructor would retry the close that just failed.
        std::mem::forget(conn);
    }
}
