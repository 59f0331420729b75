//! Transaction coordination.
//!
//! Each attempt walks `Started -> Running -> Committed | RolledBack`: begin a
//! transaction, run the statement, then commit on success or roll back on
//! failure. An attempt that fails with a deadlock is retried exactly once when
//! the connection allows it; callers needing more attempts loop themselves.

use crate::db::connection_registry::ConnectionRegistry;
use crate::db::driver::DriverTransaction;
use crate::db::executor::shape_output;
use crate::db::session_registry::Session;
use crate::error::{GraphError, GraphResult};
use crate::models::{QueryOutput, QueryRequest, TransactionOutcome, TransactionState};
use tracing::{debug, error, warn};

/// Upper bound on attempts per `transaction` call.
pub const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    connections: ConnectionRegistry,
}

impl TransactionCoordinator {
    pub fn new(connections: ConnectionRegistry) -> Self {
        Self { connections }
    }

    /// Run a statement in an explicit transaction.
    ///
    /// Returns the committed result, shaped per the connection policy, or a
    /// [`GraphError::Transaction`] describing the last failed attempt.
    pub async fn transaction(
        &self,
        session: &Session,
        request: QueryRequest,
    ) -> GraphResult<QueryOutput> {
        let policy = self.connections.policy(session.connection()).await?;

        let mut attempts = 1;
        let mut outcome = self.attempt(session, &request, attempts).await;

        if outcome.is_deadlock() && policy.retry_deadlock && attempts < MAX_ATTEMPTS {
            warn!(
                alias = %session.connection(),
                session_id = session.session_id(),
                "Deadlock detected; retrying transaction once"
            );
            attempts += 1;
            outcome = self.attempt(session, &request, attempts).await;
        }

        match outcome.result {
            Ok(payload) => Ok(shape_output(payload, policy.scrub_results)),
            Err(err) => {
                error!(
                    alias = %session.connection(),
                    session_id = session.session_id(),
                    attempts,
                    state = ?outcome.state,
                    code = %err.code,
                    error = %err.message,
                    "Transaction failed"
                );
                Err(GraphError::transaction(&err, attempts))
            }
        }
    }

    /// Begin a transaction on the session and run one attempt in it.
    async fn attempt(
        &self,
        session: &Session,
        request: &QueryRequest,
        attempt: u32,
    ) -> TransactionOutcome {
        debug!(
            alias = %session.connection(),
            session_id = session.session_id(),
            attempt,
            cypher = %request.cypher,
            "Beginning transaction"
        );

        match session.handle().begin_transaction().await {
            Ok(tx) => run_attempt(tx, request).await,
            Err(e) => {
                warn!(
                    alias = %session.connection(),
                    session_id = session.session_id(),
                    attempt,
                    code = %e.code,
                    "Failed to begin transaction"
                );
                TransactionOutcome::not_started(e)
            }
        }
    }
}

/// Run a statement inside `tx`, then commit it or roll it back.
///
/// A rollback failure does not replace the statement error; it is logged and
/// recorded in [`TransactionOutcome::rollback_error`]. A failed commit is
/// reported as rolled back since the handle is consumed by the commit.
pub async fn run_attempt(
    mut tx: Box<dyn DriverTransaction>,
    request: &QueryRequest,
) -> TransactionOutcome {
    debug!(state = ?TransactionState::Running, "Running statement in transaction");
    let run_result = tx.run(&request.cypher, &request.params).await;

    match run_result {
        Ok(result) => match tx.commit().await {
            Ok(()) => {
                debug!(records = result.len(), "Transaction committed");
                TransactionOutcome::committed(result)
            }
            Err(e) => {
                warn!(code = %e.code, error = %e.message, "Commit failed");
                TransactionOutcome::rolled_back(e, None)
            }
        },
        Err(e) => {
            debug!(code = %e.code, "Statement failed; rolling back");
            let rollback_error = tx.rollback().await.err();
            if let Some(rb) = &rollback_error {
                warn!(code = %rb.code, error = %rb.message, "Rollback failed");
            }
            TransactionOutcome::rolled_back(e, rollback_error)
        }
    }
}
