//! Session registry.
//!
//! Sessions are opened against a named connection and registered under
//! `(alias, session_id)`. Ids come from the connection's counter and are never
//! reused for the life of that connection, even after a session closes.

use crate::db::connection_registry::ConnectionRegistry;
use crate::db::driver::{DriverSession, SessionConfig};
use crate::error::{GraphError, GraphResult};
use crate::models::AccessMode;
use std::sync::Arc;
use tracing::{debug, warn};

/// An open session record.
///
/// Cloning is cheap; clones share the same driver session. Pass the record to
/// the query executor, the transaction coordinator and `close_session`.
#[derive(Clone)]
pub struct Session {
    connection: String,
    access_mode: AccessMode,
    session_id: u64,
    generation: u64,
    handle: Arc<dyn DriverSession>,
}

impl Session {
    /// Alias of the owning connection.
    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// The underlying driver session.
    pub fn handle(&self) -> &Arc<dyn DriverSession> {
        &self.handle
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection)
            .field("access_mode", &self.access_mode)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct SessionRegistry {
    connections: ConnectionRegistry,
}

impl SessionRegistry {
    pub fn new(connections: ConnectionRegistry) -> Self {
        Self { connections }
    }

    /// Open a session on a connection with the given default access mode.
    pub async fn open_session(&self, alias: &str, access_mode: AccessMode) -> GraphResult<Session> {
        let slot = self.connections.allocate_session(alias).await?;

        let handle = slot
            .driver
            .open_session(SessionConfig {
                database: slot.database,
                access_mode,
            })
            .await
            .map_err(|e| {
                warn!(
                    alias = %alias,
                    session_id = slot.session_id,
                    code = %e.code,
                    "Failed to open session"
                );
                GraphError::from(e)
            })?;

        let session = Session {
            connection: alias.to_string(),
            access_mode,
            session_id: slot.session_id,
            generation: slot.generation,
            handle,
        };

        if let Err(orphan) = self.connections.insert_session(session.clone()).await {
            // Connection closed or replaced while the driver was opening the session.
            if let Err(e) = orphan.handle.close().await {
                warn!(alias = %alias, error = %e, "Failed to close orphaned session");
            }
            return Err(GraphError::connection_not_found(alias));
        }

        debug!(
            alias = %alias,
            session_id = session.session_id,
            mode = %access_mode,
            "Session opened"
        );
        Ok(session)
    }

    pub async fn open_read_session(&self, alias: &str) -> GraphResult<Session> {
        self.open_session(alias, AccessMode::Read).await
    }

    pub async fn open_write_session(&self, alias: &str) -> GraphResult<Session> {
        self.open_session(alias, AccessMode::Write).await
    }

    /// Close a session and drop it from the registry.
    ///
    /// Closing a session that is not registered (already closed, or closed
    /// along with its connection, or issued by a connection that has since
    /// been replaced) does nothing and succeeds.
    pub async fn close_session(&self, session: &Session) -> GraphResult<()> {
        let Some(registered) = self.connections.remove_session(session).await else {
            debug!(
                alias = %session.connection,
                session_id = session.session_id,
                "Session not registered; nothing to close"
            );
            return Ok(());
        };

        registered.handle.close().await?;
        debug!(
            alias = %session.connection,
            session_id = session.session_id,
            "Session closed"
        );
        Ok(())
    }

    /// Number of open sessions on a connection.
    pub async fn session_count(&self, alias: &str) -> GraphResult<usize> {
        self.connections.session_count(alias).await
    }

    /// The connection registry this session registry resolves aliases with.
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }
}
