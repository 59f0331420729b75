//! Error types for the session layer.
//!
//! Every fallible operation past the connection-validation boundary returns a
//! [`GraphError`]. Driver failures keep the driver's status code so callers can
//! tell a lock conflict from a syntax error without parsing messages.

use crate::db::driver::DriverError;
use crate::models::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Connection failed: {message}")]
    Connection {
        message: String,
        /// Driver status code, when the driver supplied one
        code: Option<String>,
    },

    #[error("Connection not found: {alias}")]
    ConnectionNotFound { alias: String },

    #[error("Driver error [{code}]: {message}")]
    Driver { code: String, message: String },

    #[error("Transaction failed after {attempts} attempt(s) [{code}]: {message}")]
    Transaction {
        kind: ErrorKind,
        code: String,
        message: String,
        attempts: u32,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl GraphError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code,
        }
    }

    /// Create a connection not found error.
    pub fn connection_not_found(alias: impl Into<String>) -> Self {
        Self::ConnectionNotFound {
            alias: alias.into(),
        }
    }

    /// Create a transaction error from the driver error of the last attempt.
    pub fn transaction(err: &DriverError, attempts: u32) -> Self {
        Self::Transaction {
            kind: ErrorKind::classify(err),
            code: err.code.clone(),
            message: err.message.clone(),
            attempts,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Driver status code carried by this error, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Connection { code, .. } => code.as_deref(),
            Self::Driver { code, .. } | Self::Transaction { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Only lock conflicts qualify; the caller owns any retry beyond the
    /// single one the transaction coordinator already performs.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transaction { kind, .. } => *kind == ErrorKind::Deadlock,
            Self::Driver { code, .. } => code == crate::db::driver::DEADLOCK_ERROR_CODE,
            _ => false,
        }
    }
}

impl From<DriverError> for GraphError {
    fn from(err: DriverError) -> Self {
        Self::Driver {
            code: err.code,
            message: err.message,
        }
    }
}

/// Result type alias for session-layer operations.
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::driver::DEADLOCK_ERROR_CODE;

    #[test]
    fn test_error_display() {
        let err = GraphError::connection_not_found("main");
        assert_eq!(err.to_string(), "Connection not found: main");
    }

    #[test]
    fn test_driver_error_keeps_code() {
        let err: GraphError = DriverError::new("Neo.ClientError.Statement.SyntaxError", "bad").into();
        assert_eq!(err.code(), Some("Neo.ClientError.Statement.SyntaxError"));
        assert!(err.to_string().contains("SyntaxError"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transaction_error_classification() {
        let deadlock = DriverError::new(DEADLOCK_ERROR_CODE, "lock cycle");
        let err = GraphError::transaction(&deadlock, 2);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("2 attempt(s)"));

        let other = DriverError::new("Neo.ClientError.Schema.ConstraintValidationFailed", "dup");
        let err = GraphError::transaction(&other, 1);
        assert!(!err.is_retryable());
        match err {
            GraphError::Transaction { kind, attempts, .. } => {
                assert_eq!(kind, ErrorKind::Other);
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_code_absent_for_local_errors() {
        assert_eq!(GraphError::config("x").code(), None);
        assert_eq!(GraphError::connection("x", None).code(), None);
    }
}
