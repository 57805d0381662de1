//! Error types for the access layer
//!
//! Every backend-level failure is wrapped into a single [`DatabaseError`]
//! kind with the original cause attached, so callers never branch on
//! driver-specific error types.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Boxed error crossing the backend seam.
///
/// Drivers report failures as whatever error type they use internally;
/// the session wraps them into [`DatabaseError`] at the boundary.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for database operations
///
/// Variants group failures by phase (connection, statement execution,
/// transaction control, row iteration) for readable messages; callers are
/// expected to handle all of them uniformly. The underlying driver error,
/// when present, is retrievable through [`std::error::Error::source`] or
/// [`DatabaseError::cause`].
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Connection lifecycle failure (open, probe, close)
    #[error("connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BackendError>,
    },

    /// Statement execution failure
    #[error("statement error: {message}")]
    Statement {
        message: String,
        #[source]
        source: Option<BackendError>,
    },

    /// Transaction control failure (begin, commit, rollback, savepoints)
    #[error("transaction error: {message}")]
    Transaction {
        message: String,
        #[source]
        source: Option<BackendError>,
    },

    /// Row iteration failure while consuming a result cursor
    #[error("row error: {message}")]
    Row {
        message: String,
        #[source]
        source: Option<BackendError>,
    },
}

impl DatabaseError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        DatabaseError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error with the driver cause
    pub fn connection_with_source<S: Into<String>>(message: S, source: BackendError) -> Self {
        DatabaseError::Connection {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a statement error
    pub fn statement<S: Into<String>>(message: S) -> Self {
        DatabaseError::Statement {
            message: message.into(),
            source: None,
        }
    }

    /// Create a statement error with the driver cause
    pub fn statement_with_source<S: Into<String>>(message: S, source: BackendError) -> Self {
        DatabaseError::Statement {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a transaction error
    pub fn transaction<S: Into<String>>(message: S) -> Self {
        DatabaseError::Transaction {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transaction error with the driver cause
    pub fn transaction_with_source<S: Into<String>>(message: S, source: BackendError) -> Self {
        DatabaseError::Transaction {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a row iteration error with the driver cause
    pub fn row_with_source<S: Into<String>>(message: S, source: BackendError) -> Self {
        DatabaseError::Row {
            message: message.into(),
            source: Some(source),
        }
    }

    /// The original driver-level cause, when one was captured
    pub fn cause(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatabaseError::Connection { source, .. }
            | DatabaseError::Statement { source, .. }
            | DatabaseError::Transaction { source, .. }
            | DatabaseError::Row { source, .. } => source
                .as_deref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DatabaseError::connection("failed to connect");
        assert!(matches!(err, DatabaseError::Connection { .. }));
        assert!(err.cause().is_none());

        let err = DatabaseError::statement("invalid SQL");
        assert!(matches!(err, DatabaseError::Statement { .. }));

        let err = DatabaseError::transaction("commit failed");
        assert!(matches!(err, DatabaseError::Transaction { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = DatabaseError::connection("connection refused");
        assert_eq!(err.to_string(), "connection error: connection refused");

        let err = DatabaseError::statement("no such table");
        assert_eq!(err.to_string(), "statement error: no such table");
    }

    #[test]
    fn test_cause_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = DatabaseError::connection_with_source("server unreachable", Box::new(io));

        let cause = err.cause().expect("cause should be captured");
        assert_eq!(cause.to_string(), "refused");

        // also reachable through the std Error chain
        use std::error::Error;
        assert!(err.source().is_some());
    }
}
