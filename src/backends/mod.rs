//! Database backend implementations
//!
//! Concrete drivers implementing the [`Connector`](crate::core::Connector)
//! and [`BackendConnection`](crate::core::BackendConnection) traits, each
//! behind its own cargo feature.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteConnector};
