//! Query-related data models.
//!
//! This module defines Cypher requests, the raw result sets a driver returns,
//! and the outcome records used while driving a transaction.

use crate::db::driver::DriverError;
use crate::models::value::GraphValue;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Named query parameters.
pub type Params = BTreeMap<String, GraphValue>;

/// A normalized result row: column name to plain value.
pub type JsonRow = serde_json::Map<String, JsonValue>;

/// A Cypher statement and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub cypher: String,
    /// Empty when the caller supplied none
    pub params: Params,
}

impl QueryRequest {
    /// Create a request with no parameters.
    pub fn new(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            params: Params::new(),
        }
    }

    /// Create a request from optional parameters, defaulting to an empty map.
    pub fn with_optional_params(cypher: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            cypher: cypher.into(),
            params: params.unwrap_or_default(),
        }
    }

    /// Add a parameter to this query.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// One record of a raw result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub keys: Vec<String>,
    pub values: Vec<GraphValue>,
}

impl Record {
    pub fn new(keys: Vec<String>, values: Vec<GraphValue>) -> Self {
        Self { keys, values }
    }

    /// Get the value of a column by name.
    pub fn get(&self, key: &str) -> Option<&GraphValue> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|idx| self.values.get(idx))
    }

    /// Iterate over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GraphValue)> {
        self.keys.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn into_pairs(self) -> impl Iterator<Item = (String, GraphValue)> {
        self.keys.into_iter().zip(self.values)
    }
}

/// A raw result set as returned by the driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub keys: Vec<String>,
    pub records: Vec<Record>,
}

impl ResultSet {
    /// Build a result set from column names and rows of values.
    pub fn from_rows<K: Into<String>>(keys: Vec<K>, rows: Vec<Vec<GraphValue>>) -> Self {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let records = rows
            .into_iter()
            .map(|values| Record::new(keys.clone(), values))
            .collect();
        Self { keys, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// What a query or transaction hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Normalized rows (connection scrubs results)
    Rows(Vec<JsonRow>),
    /// Normalization was requested but the result had no records
    Empty,
    /// The driver's result, untouched (connection opted out of scrubbing)
    Raw(ResultSet),
}

impl QueryOutput {
    /// Wrap the output of `normalize_result_set`.
    pub fn from_normalized(rows: Option<Vec<JsonRow>>) -> Self {
        rows.map_or(Self::Empty, Self::Rows)
    }

    /// Normalized rows, if this output was normalized and non-empty.
    pub fn rows(&self) -> Option<&[JsonRow]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Raw result set, if scrubbing was disabled.
    pub fn raw(&self) -> Option<&ResultSet> {
        match self {
            Self::Raw(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Rows(rows) => rows.is_empty(),
            Self::Empty => true,
            Self::Raw(result) => result.is_empty(),
        }
    }

    /// JSON view of normalized output: an array of rows, or `null` when empty.
    /// Raw output has no JSON form and yields `None`.
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            Self::Rows(rows) => Some(JsonValue::Array(
                rows.iter().cloned().map(JsonValue::Object).collect(),
            )),
            Self::Empty => Some(JsonValue::Null),
            Self::Raw(_) => None,
        }
    }
}

/// Classification of a failed transactional run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    None,
    Deadlock,
    Other,
}

impl ErrorKind {
    /// Map a driver error to its retry class.
    pub fn classify(err: &DriverError) -> Self {
        if err.is_deadlock() {
            Self::Deadlock
        } else {
            Self::Other
        }
    }
}

/// Lifecycle of a single transaction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Started,
    Running,
    Committed,
    RolledBack,
}

impl TransactionState {
    /// Check if the attempt has resolved.
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

/// Result of one attempt at running a transactional query.
#[derive(Debug)]
pub struct TransactionOutcome {
    pub state: TransactionState,
    /// Committed result, or the begin/run/commit failure
    pub result: Result<ResultSet, DriverError>,
    /// Set when rolling back after a failure failed too
    pub rollback_error: Option<DriverError>,
}

impl TransactionOutcome {
    pub fn committed(payload: ResultSet) -> Self {
        Self {
            state: TransactionState::Committed,
            result: Ok(payload),
            rollback_error: None,
        }
    }

    pub fn rolled_back(error: DriverError, rollback_error: Option<DriverError>) -> Self {
        Self {
            state: TransactionState::RolledBack,
            result: Err(error),
            rollback_error,
        }
    }

    /// The transaction could not be started; nothing ran.
    pub fn not_started(error: DriverError) -> Self {
        Self {
            state: TransactionState::Started,
            result: Err(error),
            rollback_error: None,
        }
    }

    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn payload(&self) -> Option<&ResultSet> {
        self.result.as_ref().ok()
    }

    pub fn error_kind(&self) -> ErrorKind {
        match &self.result {
            Ok(_) => ErrorKind::None,
            Err(e) => ErrorKind::classify(e),
        }
    }

    pub fn is_deadlock(&self) -> bool {
        self.error_kind() == ErrorKind::Deadlock
    }
}
