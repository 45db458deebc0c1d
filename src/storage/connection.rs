//! # Transactional Connections
//!
//! A [`TransactionalConnection`] wraps one pooled connection for the duration of a
//! single unit of work. Manual-commit mode is an explicit `BEGIN`; the caller ends
//! it with [`commit`](TransactionalConnection::commit) or
//! [`rollback`](TransactionalConnection::rollback) and releases the connection
//! with [`close`](TransactionalConnection::close).

use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyConnection, Executor};
use std::fmt;
use tracing::{debug, warn};

/// Driver identity reported by `sqlx::Any` for PostgreSQL connections
pub const POSTGRESQL_DATABASE: &str = "PostgreSQL";

/// SQLSTATE `active_sql_transaction`
pub const PG_ACTIVE_SQL_TRANSACTION_STATE: &str = "25001";

/// Transaction isolation level requested on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Whether a failed isolation-level request is the PostgreSQL startup condition
/// where the connection already carries an open transaction.
pub fn is_active_transaction_state(backend_name: &str, sql_state: Option<&str>) -> bool {
    backend_name.contains(POSTGRESQL_DATABASE)
        && sql_state.is_some_and(|state| state == PG_ACTIVE_SQL_TRANSACTION_STATE)
}

pub(crate) fn is_active_transaction_error(backend_name: &str, error: &sqlx::Error) -> bool {
    let code = error.as_database_error().and_then(|e| e.code());
    is_active_transaction_state(backend_name, code.as_deref())
}

/// A pooled connection borrowed for one unit of work.
///
/// Dropping it with a transaction still open detaches the connection from the
/// pool so the open transaction dies with the session.
pub struct TransactionalConnection {
    conn: Option<PoolConnection<Any>>,
    backend: String,
    in_transaction: bool,
}

impl TransactionalConnection {
    pub(crate) fn new(conn: PoolConnection<Any>) -> Self {
        let backend = conn.backend_name().to_string();
        Self { conn: Some(conn), backend, in_transaction: false }
    }

    /// Wrap a connection under a different driver identity.
    #[cfg(test)]
    pub(crate) fn with_backend_name(conn: PoolConnection<Any>, backend: &str) -> Self {
        Self { conn: Some(conn), backend: backend.to_string(), in_transaction: false }
    }

    /// Driver identity of the underlying connection (`PostgreSQL`, `SQLite`)
    pub fn backend_name(&self) -> &str {
        &self.backend
    }

    /// Whether a manual-commit transaction is currently open
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// The connection to run statements on.
    pub fn executor(&mut self) -> Result<&mut AnyConnection, sqlx::Error> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| sqlx::Error::Protocol("connection already released".to_string()))
    }

    /// Leave autocommit mode by opening a transaction.
    ///
    /// A failed `BEGIN` leaves the session state unknown (PostgreSQL rejects it
    /// inside an aborted transaction), so the connection is treated as being in
    /// a transaction and release rolls it back or discards it.
    pub async fn begin(&mut self) -> Result<(), sqlx::Error> {
        self.in_transaction = true;
        self.executor()?.execute("BEGIN").await?;
        Ok(())
    }

    /// Request an isolation level for the open transaction.
    ///
    /// PostgreSQL requires this to be the first statement of the transaction.
    /// SQLite transactions are always serializable, so no statement is issued.
    pub async fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<(), sqlx::Error> {
        if !self.backend.contains(POSTGRESQL_DATABASE) {
            debug!(backend = %self.backend, isolation = %level, "Backend does not support isolation levels; skipping");
            return Ok(());
        }

        let sql = format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql());
        self.executor()?.execute(sql.as_str()).await?;
        Ok(())
    }

    /// Commit the open transaction. No-op in autocommit mode.
    pub async fn commit(&mut self) -> Result<(), sqlx::Error> {
        if !self.in_transaction {
            return Ok(());
        }
        self.executor()?.execute("COMMIT").await?;
        self.in_transaction = false;
        Ok(())
    }

    /// Roll back the open transaction. No-op in autocommit mode.
    pub async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        if !self.in_transaction {
            return Ok(());
        }
        self.executor()?.execute("ROLLBACK").await?;
        self.in_transaction = false;
        Ok(())
    }

    /// Release the connection back to the pool, rolling back any open transaction.
    pub async fn close(mut self) {
        if let Err(e) = self.rollback().await {
            warn!(error = %e, backend = %self.backend, "Failed to roll back transaction while releasing connection");
        }
        // Drop handles both the clean and the still-in-transaction case.
    }
}

impl Drop for TransactionalConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.in_transaction {
                warn!(backend = %self.backend, "Connection released with an open transaction; discarding it");
                drop(conn.detach());
            }
        }
    }
}

impl fmt::Debug for TransactionalConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionalConnection")
            .field("backend", &self.backend)
            .field("in_transaction", &self.in_transaction)
            .field("released", &self.conn.is_none())
            .finish()
    }
}
