//! Session service facade.
//!
//! [`GraphService`] wires the connection registry, session registry, query
//! executor and transaction coordinator together around one driver factory,
//! and exposes the full operation set in one place.

use crate::config::Config;
use crate::db::{
    ConnectionRegistry, DriverFactory, QueryExecutor, Session, SessionRegistry,
    TransactionCoordinator,
};
use crate::error::GraphResult;
use crate::models::{
    AccessMode, ConnectionOutcome, ConnectionParams, ConnectionSummary, QueryOutput, QueryRequest,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct GraphService {
    connections: ConnectionRegistry,
    sessions: SessionRegistry,
    executor: QueryExecutor,
    transactions: TransactionCoordinator,
}

impl GraphService {
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        let connections = ConnectionRegistry::new(factory);
        Self {
            sessions: SessionRegistry::new(connections.clone()),
            executor: QueryExecutor::new(connections.clone()),
            transactions: TransactionCoordinator::new(connections.clone()),
            connections,
        }
    }

    /// Open every connection listed in `config`.
    ///
    /// A malformed connection string fails the whole call before anything is
    /// opened. Per-connection outcomes are returned in configuration order.
    pub async fn open_configured(&self, config: &Config) -> GraphResult<Vec<ConnectionOutcome>> {
        let params = config.parse_connections()?;
        info!(count = params.len(), "Opening preconfigured connections");

        let mut outcomes = Vec::with_capacity(params.len());
        for p in params {
            let alias = p.alias.clone().unwrap_or_default();
            let outcome = self.connections.open_connection(p).await;
            if !outcome.is_ok() {
                warn!(alias = %alias, errors = ?outcome.error_text, "Preconfigured connection failed");
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    pub async fn open_connection(&self, params: ConnectionParams) -> ConnectionOutcome {
        self.connections.open_connection(params).await
    }

    /// Close one connection, or every connection when `alias` is `None`.
    pub async fn close_connection(&self, alias: Option<&str>) -> GraphResult<()> {
        self.connections.close_connection(alias).await
    }

    pub async fn open_session(&self, alias: &str, mode: AccessMode) -> GraphResult<Session> {
        self.sessions.open_session(alias, mode).await
    }

    pub async fn open_read_session(&self, alias: &str) -> GraphResult<Session> {
        self.sessions.open_read_session(alias).await
    }

    pub async fn open_write_session(&self, alias: &str) -> GraphResult<Session> {
        self.sessions.open_write_session(alias).await
    }

    pub async fn close_session(&self, session: &Session) -> GraphResult<()> {
        self.sessions.close_session(session).await
    }

    pub async fn query(&self, session: &Session, request: QueryRequest) -> GraphResult<QueryOutput> {
        self.executor.query(session, request).await
    }

    pub async fn transaction(
        &self,
        session: &Session,
        request: QueryRequest,
    ) -> GraphResult<QueryOutput> {
        self.transactions.transaction(session, request).await
    }

    pub async fn list_connections(&self) -> Vec<ConnectionSummary> {
        self.connections.list_connections().await
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}
