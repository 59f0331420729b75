//! Cypher Session Library
//!
//! Tracks named graph-database connections, hands out read/write sessions,
//! runs auto-commit queries and deadlock-aware transactions, and normalizes
//! driver-native results (64-bit integers, nodes, relationships, temporal
//! values) into plain JSON.
//!
//! The network driver is injected through [`db::DriverFactory`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod telemetry;

pub use config::Config;
pub use error::{GraphError, GraphResult};
pub use service::GraphService;
