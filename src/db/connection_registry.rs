//! Named connection registry.
//!
//! Each connection owns one driver handle, its policy flags, a monotonic
//! session counter, and the map of sessions currently open on it. Closing a
//! connection closes those sessions before the driver handle is released.

use crate::db::driver::{BasicAuth, DriverFactory, GraphDriver};
use crate::db::session_registry::Session;
use crate::error::{GraphError, GraphResult};
use crate::models::{
    ConnectionConfig, ConnectionOutcome, ConnectionParams, ConnectionPolicy, ConnectionSummary,
};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

struct ConnectionEntry {
    config: ConnectionConfig,
    driver: Arc<dyn GraphDriver>,
    /// Distinguishes this entry from earlier connections under the same alias
    generation: u64,
    /// Next session id; only ever incremented
    session_counter: u64,
    sessions: HashMap<u64, Session>,
}

impl ConnectionEntry {
    fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            alias: self.config.alias.clone(),
            database: self.config.database.clone(),
            uri: self.config.masked_uri(),
            retry_deadlock: self.config.policy.retry_deadlock,
            scrub_results: self.config.policy.scrub_results,
            open_sessions: self.sessions.len(),
            sessions_issued: self.session_counter,
        }
    }

    /// Close every session, then the driver handle.
    ///
    /// Session closes run concurrently and are all awaited before the driver
    /// goes away. Their failures are logged; only a driver close failure is
    /// returned.
    async fn close(self) -> GraphResult<()> {
        let alias = self.config.alias;
        let closes = self.sessions.into_values().map(|session| {
            let alias = alias.clone();
            async move {
                if let Err(e) = session.handle().close().await {
                    warn!(
                        alias = %alias,
                        session_id = session.session_id(),
                        error = %e,
                        "Failed to close session during connection close"
                    );
                }
            }
        });
        let closed = join_all(closes).await.len();
        debug!(alias = %alias, sessions = closed, "Closed connection sessions");

        self.driver
            .close()
            .await
            .map_err(|e| GraphError::connection(e.message, Some(e.code)))?;
        info!(alias = %alias, "Connection closed");
        Ok(())
    }
}

/// Allocation handed to the session registry when a session is opened.
pub(crate) struct SessionSlot {
    pub session_id: u64,
    pub generation: u64,
    pub driver: Arc<dyn GraphDriver>,
    pub database: String,
}

#[derive(Clone)]
pub struct ConnectionRegistry {
    factory: Arc<dyn DriverFactory>,
    connections: Arc<RwLock<HashMap<String, ConnectionEntry>>>,
    generations: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    /// Create an empty registry that builds drivers with `factory`.
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            factory,
            connections: Arc::new(RwLock::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Validate parameters, build a driver and register it under its alias.
    ///
    /// Validation and driver construction failures come back as a failed
    /// [`ConnectionOutcome`]; nothing is registered in that case. An existing
    /// connection with the same alias is replaced, and closed.
    pub async fn open_connection(&self, params: ConnectionParams) -> ConnectionOutcome {
        let config = match params.validate() {
            Ok(config) => config,
            Err(errors) => {
                warn!(errors = ?errors, "Rejected connection parameters");
                return ConnectionOutcome::failure(errors);
            }
        };

        info!(
            alias = %config.alias,
            uri = %config.masked_uri(),
            database = %config.database,
            retry_deadlock = config.policy.retry_deadlock,
            scrub_results = config.policy.scrub_results,
            "Opening connection"
        );

        let auth = BasicAuth::new(&config.user, &config.password);
        let driver = match self.factory.connect(&config.uri, &auth).await {
            Ok(driver) => driver,
            Err(e) => {
                warn!(alias = %config.alias, code = %e.code, error = %e.message, "Driver rejected connection");
                return ConnectionOutcome::failure(vec![e.code]);
            }
        };

        let alias = config.alias.clone();
        let replaced = {
            let mut connections = self.connections.write().await;
            connections.insert(
                alias.clone(),
                ConnectionEntry {
                    config,
                    driver,
                    generation: self.generations.fetch_add(1, Ordering::Relaxed),
                    session_counter: 0,
                    sessions: HashMap::new(),
                },
            )
        }; // Lock released here

        if let Some(old) = replaced {
            warn!(alias = %alias, "Replaced an open connection with the same alias");
            if let Err(e) = old.close().await {
                warn!(alias = %alias, error = %e, "Failed to close replaced connection");
            }
        }

        info!(alias = %alias, "Connection opened");
        ConnectionOutcome::success()
    }

    /// Close one connection, or all of them when `alias` is `None`.
    ///
    /// Naming an unknown alias is an error. When closing several connections
    /// every one is attempted; the first driver close error is returned.
    pub async fn close_connection(&self, alias: Option<&str>) -> GraphResult<()> {
        let targets: Vec<ConnectionEntry> = {
            let mut connections = self.connections.write().await;
            match alias {
                Some(alias) => vec![
                    connections
                        .remove(alias)
                        .ok_or_else(|| GraphError::connection_not_found(alias))?,
                ],
                None => connections.drain().map(|(_, entry)| entry).collect(),
            }
        }; // Lock released here

        info!(count = targets.len(), "Closing connections");

        let mut first_error = None;
        for entry in targets {
            let alias = entry.config.alias.clone();
            if let Err(e) = entry.close().await {
                warn!(alias = %alias, error = %e, "Failed to close driver");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Policy flags of a connection.
    pub async fn policy(&self, alias: &str) -> GraphResult<ConnectionPolicy> {
        let connections = self.connections.read().await;
        connections
            .get(alias)
            .map(|entry| entry.config.policy)
            .ok_or_else(|| GraphError::connection_not_found(alias))
    }

    /// List all connections, sorted by alias.
    pub async fn list_connections(&self) -> Vec<ConnectionSummary> {
        let connections = self.connections.read().await;
        let mut summaries: Vec<ConnectionSummary> =
            connections.values().map(ConnectionEntry::summary).collect();
        summaries.sort_by(|a, b| a.alias.cmp(&b.alias));
        summaries
    }

    pub async fn contains(&self, alias: &str) -> bool {
        self.connections.read().await.contains_key(alias)
    }

    /// Get the number of registered connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Reserve the next session id of a connection.
    ///
    /// The read-increment happens under the write lock, so concurrent opens on
    /// one alias never share an id.
    pub(crate) async fn allocate_session(&self, alias: &str) -> GraphResult<SessionSlot> {
        let mut connections = self.connections.write().await;
        let entry = connections
            .get_mut(alias)
            .ok_or_else(|| GraphError::connection_not_found(alias))?;
        let session_id = entry.session_counter;
        entry.session_counter += 1;
        Ok(SessionSlot {
            session_id,
            generation: entry.generation,
            driver: entry.driver.clone(),
            database: entry.config.database.clone(),
        })
    }

    /// Register an opened session. Hands the session back if its connection
    /// was closed or replaced in the meantime.
    pub(crate) async fn insert_session(&self, session: Session) -> Result<(), Session> {
        let mut connections = self.connections.write().await;
        match connections.get_mut(session.connection()) {
            Some(entry) if entry.generation == session.generation() => {
                entry.sessions.insert(session.session_id(), session);
                Ok(())
            }
            _ => Err(session),
        }
    }

    /// Unregister a session, returning it if it was registered.
    ///
    /// A session from an earlier connection under the same alias matches
    /// nothing, even if its id was issued again.
    pub(crate) async fn remove_session(&self, session: &Session) -> Option<Session> {
        let mut connections = self.connections.write().await;
        connections
            .get_mut(session.connection())
            .filter(|entry| entry.generation == session.generation())
            .and_then(|entry| entry.sessions.remove(&session.session_id()))
    }

    /// Number of open sessions on a connection.
    pub async fn session_count(&self, alias: &str) -> GraphResult<usize> {
        let connections = self.connections.read().await;
        connections
            .get(alias)
            .map(|entry| entry.sessions.len())
            .ok_or_else(|| GraphError::connection_not_found(alias))
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry").finish_non_exhaustive()
    }
}
