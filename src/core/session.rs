//! The caller-facing database session
//!
//! A [`Session`] owns one lazily-established backend connection plus the
//! state that rides along with it: the savepoint stack and the most
//! recently captured generated key. Every statement and transaction
//! operation reconnects transparently first if the connection is gone, so
//! the handle heals itself after an external disconnect.
//!
//! Sessions are not internally synchronized; a session belongs to one
//! caller at a time, and independent sessions each hold their own
//! connection with no shared state between them.

use super::backend::{BackendConnection, BoundStatement, Connector};
use super::config::ConnectParams;
use super::cursor::ResultCursor;
use super::error::{DatabaseError, Result};
use super::transaction::SavepointStack;
use super::value::Value;

/// A lazily-connected database session
pub struct Session {
    connector: Box<dyn Connector>,
    params: ConnectParams,
    conn: Option<Box<dyn BackendConnection>>,
    savepoints: SavepointStack,
    last_generated_id: i64,
}

impl Session {
    /// Create a session; no connection is opened until first use
    pub fn new(connector: Box<dyn Connector>, params: ConnectParams) -> Self {
        Self {
            connector,
            params,
            conn: None,
            savepoints: SavepointStack::new(),
            last_generated_id: 0,
        }
    }

    /// Open the backend connection if it is not already open
    ///
    /// On failure the session is left fully disconnected; there is no
    /// half-open state.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        tracing::debug!(url = self.params.url(), "opening backend connection");
        match self.connector.open(&self.params) {
            Ok(conn) => {
                // tokens issued by a previous connection mean nothing to
                // this one
                self.savepoints.clear();
                self.conn = Some(conn);
                Ok(())
            }
            Err(e) => {
                self.conn = None;
                self.savepoints.clear();
                Err(DatabaseError::connection_with_source(
                    "failed to open backend connection",
                    e,
                ))
            }
        }
    }

    /// Check whether the session currently holds an open connection
    ///
    /// Fail-safe probe: any trouble asking the backend reads as "not
    /// connected". Never returns an error.
    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().map(|c| c.is_open()).unwrap_or(false)
    }

    /// Close the backend connection
    ///
    /// A no-op when not connected. The connection is cleared even when the
    /// close itself fails, along with any savepoint tokens it issued.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }
        tracing::debug!("closing backend connection");
        self.savepoints.clear();
        if let Some(mut conn) = self.conn.take() {
            conn.close().map_err(|e| {
                DatabaseError::connection_with_source("failed to close backend connection", e)
            })?;
        }
        Ok(())
    }

    /// Run SQL as an update, discarding row and key metadata
    pub fn execute(&mut self, sql: &str) -> Result<()> {
        let conn = self.ensure_connected()?;
        conn.execute_update(sql)
            .map_err(|e| DatabaseError::statement_with_source("update execution failed", e))?;
        Ok(())
    }

    /// Run an insert and capture its generated key
    ///
    /// The first generated key becomes the session's
    /// [`last_generated_id`](Self::last_generated_id). The statement must
    /// target an auto-increment column; a statement that produces no
    /// generated key is a contract violation and surfaces as an error.
    pub fn execute_capturing_id(&mut self, sql: &str) -> Result<()> {
        let conn = self.ensure_connected()?;
        let id = conn
            .execute_returning_id(sql)
            .map_err(|e| DatabaseError::statement_with_source("update execution failed", e))?;
        match id {
            Some(id) => {
                self.last_generated_id = id;
                Ok(())
            }
            None => Err(DatabaseError::statement(
                "statement produced no generated key",
            )),
        }
    }

    /// Run SQL as a query
    pub fn query(&mut self, sql: &str) -> Result<ResultCursor> {
        let conn = self.ensure_connected()?;
        let source = conn
            .query(sql)
            .map_err(|e| DatabaseError::statement_with_source("query execution failed", e))?;
        Ok(ResultCursor::new(source))
    }

    /// Prepare a reusable parameterized statement without executing it
    ///
    /// The handle borrows the session's connection and stays valid until
    /// dropped.
    pub fn prepare(&mut self, sql: &str) -> Result<PreparedStatement<'_>> {
        self.connect()?;
        let conn = self
            .conn
            .as_deref_mut()
            .ok_or_else(|| DatabaseError::connection("backend connection unavailable"))?;
        let inner = conn
            .prepare(sql)
            .map_err(|e| DatabaseError::statement_with_source("statement preparation failed", e))?;
        Ok(PreparedStatement { inner })
    }

    /// The most recently captured auto-generated key
    ///
    /// Zero before any capturing insert; overwritten by each one; stable
    /// across repeated reads.
    pub fn last_generated_id(&self) -> i64 {
        self.last_generated_id
    }

    /// Open one more transaction level
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.connect()?;
        let conn = self
            .conn
            .as_deref_mut()
            .ok_or_else(|| DatabaseError::connection("backend connection unavailable"))?;
        self.savepoints.begin(conn)
    }

    /// Finalize the innermost transaction level
    ///
    /// Committing the last open level also commits the root transaction;
    /// see [`SavepointStack::commit`] for the exact semantics and the
    /// failure caveat.
    pub fn commit_transaction(&mut self) -> Result<()> {
        let conn = self
            .conn
            .as_deref_mut()
            .ok_or_else(|| DatabaseError::transaction("no open connection to commit on"))?;
        self.savepoints.commit(conn)
    }

    /// Undo the innermost transaction level
    ///
    /// See [`SavepointStack::rollback`] for the exact semantics and the
    /// failure caveat.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        let conn = self
            .conn
            .as_deref_mut()
            .ok_or_else(|| DatabaseError::transaction("no open connection to roll back on"))?;
        self.savepoints.rollback(conn)
    }

    /// True while at least one transaction level is open
    pub fn in_transaction(&self) -> bool {
        !self.savepoints.is_empty()
    }

    /// Current transaction nesting depth
    pub fn transaction_depth(&self) -> usize {
        self.savepoints.depth()
    }

    fn ensure_connected(&mut self) -> Result<&mut (dyn BackendConnection + 'static)> {
        self.connect()?;
        self.conn
            .as_deref_mut()
            .ok_or_else(|| DatabaseError::connection("backend connection unavailable"))
    }
}

/// A prepared statement bound to a session's live connection
pub struct PreparedStatement<'session> {
    inner: Box<dyn BoundStatement + 'session>,
}

impl PreparedStatement<'_> {
    /// Execute as an update with the given parameter values
    pub fn execute(&mut self, params: &[Value]) -> Result<u64> {
        self.inner
            .execute(params)
            .map_err(|e| DatabaseError::statement_with_source("bound execution failed", e))
    }

    /// Execute as a query with the given parameter values
    pub fn query(&mut self, params: &[Value]) -> Result<ResultCursor> {
        let source = self
            .inner
            .query(params)
            .map_err(|e| DatabaseError::statement_with_source("bound query failed", e))?;
        Ok(ResultCursor::new(source))
    }
}
