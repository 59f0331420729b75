//! Connection-related data models.
//!
//! This module defines the input accepted by `open_connection`, the validated
//! configuration kept by the registry, and the summaries handed back to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Required connection fields, in the order validation reports them.
pub const REQUIRED_FIELDS: [&str; 5] = ["alias", "uri", "database", "user", "password"];

/// Default access mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Raw parameters for opening a connection.
///
/// Required fields are optional here so that incomplete input can be reported
/// field by field instead of failing on the first gap.
#[derive(Clone, Default, Deserialize)]
pub struct ConnectionParams {
    pub alias: Option<String>,
    pub uri: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    /// Contains sensitive data - never log
    pub password: Option<String>,
    /// Only `Some(false)` disables the single deadlock retry
    #[serde(default, alias = "retryDeadlock")]
    pub retry_deadlock: Option<bool>,
    /// Only `Some(false)` disables result normalization
    #[serde(default, alias = "scrubResults")]
    pub scrub_results: Option<bool>,
}

impl ConnectionParams {
    /// Create parameters with every required field set and default policies.
    pub fn new(
        alias: impl Into<String>,
        uri: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            alias: Some(alias.into()),
            uri: Some(uri.into()),
            database: Some(database.into()),
            user: Some(user.into()),
            password: Some(password.into()),
            retry_deadlock: None,
            scrub_results: None,
        }
    }

    pub fn with_retry_deadlock(mut self, retry: bool) -> Self {
        self.retry_deadlock = Some(retry);
        self
    }

    pub fn with_scrub_results(mut self, scrub: bool) -> Self {
        self.scrub_results = Some(scrub);
        self
    }

    /// Read parameters from a loosely typed JSON object.
    ///
    /// A required field holding anything but a string is treated as missing.
    /// Policy flags are only disabled by a JSON `false`; any other value,
    /// including a missing key, leaves the default in place.
    pub fn from_json(value: &JsonValue) -> Self {
        let text = |key: &str| -> Option<String> {
            value.get(key).and_then(JsonValue::as_str).map(String::from)
        };
        let flag = |camel: &str, snake: &str| -> Option<bool> {
            let explicit_false = [camel, snake]
                .iter()
                .any(|k| value.get(*k) == Some(&JsonValue::Bool(false)));
            explicit_false.then_some(false)
        };

        Self {
            alias: text("alias"),
            uri: text("uri"),
            database: text("database"),
            user: text("user"),
            password: text("password"),
            retry_deadlock: flag("retryDeadlock", "retry_deadlock"),
            scrub_results: flag("scrubResults", "scrub_results"),
        }
    }

    /// Resolve the two opt-out policy flags.
    pub fn policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            retry_deadlock: self.retry_deadlock != Some(false),
            scrub_results: self.scrub_results != Some(false),
        }
    }

    /// Validate every required field, collecting one message per bad field.
    pub fn validate(&self) -> Result<ConnectionConfig, Vec<String>> {
        let fields = [
            &self.alias,
            &self.uri,
            &self.database,
            &self.user,
            &self.password,
        ];
        let errors: Vec<String> = REQUIRED_FIELDS
            .iter()
            .zip(fields)
            .filter(|(_, v)| v.as_deref().is_none_or(str::is_empty))
            .map(|(name, _)| format!("invalid param: {name}"))
            .collect();

        if !errors.is_empty() {
            return Err(errors);
        }

        let take = |v: &Option<String>| v.clone().unwrap_or_default();
        Ok(ConnectionConfig {
            alias: take(&self.alias),
            uri: take(&self.uri),
            database: take(&self.database),
            user: take(&self.user),
            password: take(&self.password),
            policy: self.policy(),
        })
    }
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("alias", &self.alias)
            .field("uri", &self.uri.as_deref().map(mask_uri))
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("retry_deadlock", &self.retry_deadlock)
            .field("scrub_results", &self.scrub_results)
            .finish()
    }
}

/// Per-connection behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPolicy {
    pub retry_deadlock: bool,
    pub scrub_results: bool,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            retry_deadlock: true,
            scrub_results: true,
        }
    }
}

/// Validated connection configuration.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub alias: String,
    pub uri: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub policy: ConnectionPolicy,
}

impl ConnectionConfig {
    /// Display-safe version of the URI (credentials masked).
    pub fn masked_uri(&self) -> String {
        mask_uri(&self.uri)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("alias", &self.alias)
            .field("uri", &self.masked_uri())
            .field("database", &self.database)
            .field("user", &self.user)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Replace the password portion of a URI's userinfo with `****`.
pub fn mask_uri(uri: &str) -> String {
    if let Some(at_pos) = uri.rfind('@') {
        // Only a scheme separator ahead of the '@' bounds the userinfo.
        let scheme_end = uri[..at_pos].find("://").map_or(0, |p| p + 3);
        if let Some(colon_pos) = uri[scheme_end..at_pos].find(':') {
            let colon_pos = scheme_end + colon_pos;
            return format!("{}****{}", &uri[..colon_pos + 1], &uri[at_pos..]);
        }
    }
    uri.to_string()
}

/// Structured result of `open_connection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOutcome {
    pub error: bool,
    pub error_text: Vec<String>,
}

impl ConnectionOutcome {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(error_text: Vec<String>) -> Self {
        Self {
            error: true,
            error_text,
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.error
    }
}

/// Connection information returned by `list_connections` (no secrets exposed).
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSummary {
    pub alias: String,
    pub database: String,
    /// URI with the password masked
    pub uri: String,
    pub retry_deadlock: bool,
    pub scrub_results: bool,
    /// Sessions currently registered on this connection
    pub open_sessions: usize,
    /// Next session id; equals the number of sessions ever issued
    pub sessions_issued: u64,
}
