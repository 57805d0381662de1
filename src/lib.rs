//! # dbsession
//!
//! A lightweight, synchronous database access layer providing lazy
//! connection management, SQL execution, generated-key capture, and nested
//! transactions emulated over a backend that supports savepoints but not
//! true nested transactions.
//!
//! ## Features
//!
//! - **Lazy connections**: a session opens its backend connection on first
//!   use and transparently reconnects after an external disconnect
//! - **Nested transactions**: arbitrary depth of begin/commit/rollback
//!   mapped onto one flat transaction plus a savepoint stack
//! - **Generated-key capture**: inserts through the capturing path record
//!   the auto-generated primary key on the session
//! - **Uniform errors**: every driver failure is wrapped into one
//!   [`DatabaseError`](core::DatabaseError) kind with the cause preserved
//! - **Pluggable drivers**: the session talks to a small
//!   [`BackendConnection`](core::BackendConnection) trait; SQLite ships as
//!   the default feature
//!
//! Sessions are deliberately not internally synchronized: each session owns
//! one connection and belongs to one caller at a time. Independent sessions
//! operate concurrently with no shared state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dbsession::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut db = SqliteConnector::session("app.db");
//!
//!     db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")?;
//!
//!     db.execute_capturing_id("INSERT INTO users (name) VALUES ('Alice')")?;
//!     println!("inserted user {}", db.last_generated_id());
//!
//!     let cursor = db.query("SELECT name FROM users")?;
//!     cursor.for_each(|row| {
//!         if let Some(name) = row.get("name").and_then(Value::as_str) {
//!             println!("user: {name}");
//!         }
//!     })?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Nested Transactions
//!
//! ```rust,no_run
//! use dbsession::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut db = SqliteConnector::session("app.db");
//!     db.execute("CREATE TABLE accounts (id INTEGER PRIMARY KEY, balance REAL)")?;
//!
//!     db.begin_transaction()?;
//!     db.execute("INSERT INTO accounts (balance) VALUES (100.0)")?;
//!
//!     // a nested level can be undone without losing the outer work
//!     db.begin_transaction()?;
//!     db.execute("UPDATE accounts SET balance = 0 WHERE id = 1")?;
//!     db.rollback_transaction()?;
//!
//!     db.commit_transaction()?;
//!     Ok(())
//! }
//! ```
//!
//! Committing an inner level only merges it into its parent; nothing
//! persists until the outermost level commits. A transaction-control error
//! leaves the in-flight transaction unusable, and the session should be
//! disconnected and recreated.

/// Core types and traits
pub mod core;

/// Database backend implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use dbsession::prelude::*;
///
/// fn main() -> Result<()> {
///     let mut db = SqliteConnector::session(":memory:");
///     db.connect()?;
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::core::{
        BackendConnection, ConnectParams, Connector, DatabaseError, PreparedStatement, Result,
        ResultCursor, Row, Session, Value,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::backends::SqliteConnector;
}

// Re-export at root level for convenience
pub use crate::core::{
    BackendConnection, ConnectParams, Connector, DatabaseError, PreparedStatement, Result,
    ResultCursor, Row, SavepointStack, Session, Value,
};

#[cfg(feature = "sqlite")]
pub use backends::SqliteConnector;
