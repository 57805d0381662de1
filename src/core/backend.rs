//! Backend connection traits
//!
//! This is the seam between the access layer and the driver that actually
//! talks to a database server. The layer consumes a small set of
//! capabilities (execute, query, generated-key capture, autocommit control,
//! savepoints, commit/rollback) and everything above it is driver-agnostic.
//! No wire format is assumed here; it is defined entirely by whichever
//! driver is plugged in.

use super::config::ConnectParams;
use super::error::BackendError;
use super::value::{Row, Value};

/// Result type for driver-level operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Opaque handle to a savepoint created by a backend connection
///
/// Tokens are only meaningful to the connection that issued them and never
/// outlive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavepointToken {
    name: String,
}

impl SavepointToken {
    /// Create a token for a driver-assigned savepoint name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    /// The driver-assigned savepoint name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A forward-only stream of result rows
///
/// Position advances monotonically; there is no way to rewind. Whether rows
/// are streamed from the server or materialized up front is a driver
/// decision.
pub trait RowSource {
    /// Fetch the next row, or `None` once the result set is exhausted
    fn next_row(&mut self) -> BackendResult<Option<Row>>;
}

/// A reusable parameterized statement bound to a live connection
pub trait BoundStatement {
    /// Execute as an update with the given parameter values, returning the
    /// number of affected rows
    fn execute(&mut self, params: &[Value]) -> BackendResult<u64>;

    /// Execute as a query with the given parameter values
    fn query(&mut self, params: &[Value]) -> BackendResult<Box<dyn RowSource>>;
}

/// The connection capability a driver must provide
///
/// All methods are synchronous and block until the server responds.
pub trait BackendConnection: Send {
    /// Run SQL as an update, returning the number of affected rows
    fn execute_update(&mut self, sql: &str) -> BackendResult<u64>;

    /// Run SQL as an update and report the generated key, if the statement
    /// produced one
    ///
    /// A statement that changes rows without generating a key reports
    /// `None`, not some earlier statement's key.
    fn execute_returning_id(&mut self, sql: &str) -> BackendResult<Option<i64>>;

    /// Run SQL as a query
    fn query(&mut self, sql: &str) -> BackendResult<Box<dyn RowSource>>;

    /// Prepare a parameterized statement without executing it
    fn prepare<'conn>(&'conn mut self, sql: &str) -> BackendResult<Box<dyn BoundStatement + 'conn>>;

    /// Switch between autocommit and manual-commit mode
    fn set_autocommit(&mut self, autocommit: bool) -> BackendResult<()>;

    /// Create a savepoint at the current point of the open transaction
    fn create_savepoint(&mut self) -> BackendResult<SavepointToken>;

    /// Release a savepoint, keeping the writes made since it
    fn release_savepoint(&mut self, token: &SavepointToken) -> BackendResult<()>;

    /// Undo the writes made since the savepoint, keeping earlier ones
    fn rollback_to_savepoint(&mut self, token: &SavepointToken) -> BackendResult<()>;

    /// Commit the open transaction
    fn commit(&mut self) -> BackendResult<()>;

    /// Roll back the open transaction
    fn rollback(&mut self) -> BackendResult<()>;

    /// Whether the server still considers this connection open
    fn is_open(&self) -> bool;

    /// Close the connection
    fn close(&mut self) -> BackendResult<()>;
}

/// Opens backend connections from stored parameters
///
/// The session calls this lazily: on first use and again after any
/// disconnect.
pub trait Connector: Send {
    /// Open a fresh connection
    fn open(&self, params: &ConnectParams) -> BackendResult<Box<dyn BackendConnection>>;
}
