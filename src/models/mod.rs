//! Data models for the session layer.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod query;
pub mod value;

// Re-export commonly used types
pub use connection::{
    AccessMode, ConnectionConfig, ConnectionOutcome, ConnectionParams, ConnectionPolicy,
    ConnectionSummary, REQUIRED_FIELDS, mask_uri,
};
pub use query::{
    ErrorKind, JsonRow, Params, QueryOutput, QueryRequest, Record, ResultSet, TransactionOutcome,
    TransactionState,
};
pub use value::{
    Duration, GraphValue, Node, Path, PathSegment, Point, PropertyMap, Relationship, Temporal,
    TemporalKind,
};
