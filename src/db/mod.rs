//! Session and transaction layer over an injected graph driver.
//!
//! This module provides:
//! - The driver contract (factory, driver, session, transaction traits)
//! - The named connection registry
//! - The session registry
//! - Auto-commit query execution
//! - Transaction coordination with a single deadlock retry
//! - Normalization of driver values into plain JSON

pub mod connection_registry;
pub mod driver;
pub mod executor;
pub mod normalizer;
pub mod session_registry;
pub mod transaction;

pub use connection_registry::ConnectionRegistry;
pub use driver::{
    BasicAuth, DEADLOCK_ERROR_CODE, DriverError, DriverFactory, DriverSession, DriverTransaction,
    GraphDriver, SessionConfig,
};
pub use executor::QueryExecutor;
pub use normalizer::{
    MAX_SAFE_INTEGER, MIN_SAFE_INTEGER, RecordToJson, is_safe_integer, normalize_params,
    normalize_result_set, normalize_value,
};
pub use session_registry::{Session, SessionRegistry};
pub use transaction::{TransactionCoordinator, run_attempt};
