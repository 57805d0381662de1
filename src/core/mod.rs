//! Core types and traits of the access layer
//!
//! This module holds the driver-agnostic pieces: error types, the backend
//! connection traits, connection parameters, the result cursor, the
//! savepoint stack, and the session that ties them together.

pub mod backend;
pub mod config;
pub mod cursor;
pub mod error;
pub mod session;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use backend::{BackendConnection, BackendResult, BoundStatement, Connector, RowSource, SavepointToken};
pub use config::ConnectParams;
pub use cursor::ResultCursor;
pub use error::{BackendError, DatabaseError, Result};
pub use session::{PreparedStatement, Session};
pub use transaction::SavepointStack;
pub use value::{Row, Value};
