//! Driver contract.
//!
//! The session layer never talks to the network itself. It drives an injected
//! graph driver through these traits: a factory that builds a driver from a
//! URI and credentials, a driver that hands out sessions, sessions that run
//! auto-commit statements or begin transactions, and transactions that run,
//! commit and roll back.

use crate::models::{AccessMode, Params, ResultSet};
use async_trait::async_trait;
use std::sync::Arc;

/// Status code the server reports when a transaction lost a lock cycle.
pub const DEADLOCK_ERROR_CODE: &str = "Neo.TransientError.Transaction.DeadlockDetected";

/// An error reported by the driver, carrying the server status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct DriverError {
    pub code: String,
    pub message: String,
}

impl DriverError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if this is the transient deadlock error.
    pub fn is_deadlock(&self) -> bool {
        self.code == DEADLOCK_ERROR_CODE
    }
}

/// Basic username/password authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub user: String,
    /// Contains sensitive data - never log
    pub password: String,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"****")
            .finish()
    }
}

/// Options for opening a driver session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub database: String,
    pub access_mode: AccessMode,
}

/// Builds driver handles.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn connect(
        &self,
        uri: &str,
        auth: &BasicAuth,
    ) -> Result<Arc<dyn GraphDriver>, DriverError>;
}

/// A connected driver; owns its own connection pool.
#[async_trait]
pub trait GraphDriver: Send + Sync {
    async fn open_session(
        &self,
        config: SessionConfig,
    ) -> Result<Arc<dyn DriverSession>, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}

/// A driver session with a fixed default access mode.
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Run a statement in an auto-commit transaction.
    async fn run(&self, cypher: &str, params: &Params) -> Result<ResultSet, DriverError>;

    async fn begin_transaction(&self) -> Result<Box<dyn DriverTransaction>, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}

/// An explicit transaction. Commit and rollback consume the handle.
#[async_trait]
pub trait DriverTransaction: Send {
    async fn run(&mut self, cypher: &str, params: &Params) -> Result<ResultSet, DriverError>;

    async fn commit(self: Box<Self>) -> Result<(), DriverError>;

    async fn rollback(self: Box<Self>) -> Result<(), DriverError>;
}
