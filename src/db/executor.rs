//! Query execution engine.
//!
//! Runs single auto-commit statements against a session. Transient failures
//! are not retried here; the driver's auto-commit semantics apply as-is.

use crate::db::connection_registry::ConnectionRegistry;
use crate::db::normalizer::normalize_result_set;
use crate::db::session_registry::Session;
use crate::error::{GraphError, GraphResult};
use crate::models::{QueryOutput, QueryRequest, ResultSet};
use std::time::Instant;
use tracing::{debug, warn};

/// Query executor that handles auto-commit query execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    connections: ConnectionRegistry,
}

impl QueryExecutor {
    pub fn new(connections: ConnectionRegistry) -> Self {
        Self { connections }
    }

    /// Run a statement once and shape the result per the connection policy.
    pub async fn query(&self, session: &Session, request: QueryRequest) -> GraphResult<QueryOutput> {
        let policy = self.connections.policy(session.connection()).await?;
        let start = Instant::now();

        debug!(
            alias = %session.connection(),
            session_id = session.session_id(),
            cypher = %request.cypher,
            params = request.params.len(),
            "Executing query"
        );

        let result = session
            .handle()
            .run(&request.cypher, &request.params)
            .await
            .map_err(|e| {
                warn!(
                    alias = %session.connection(),
                    session_id = session.session_id(),
                    code = %e.code,
                    error = %e.message,
                    "Query failed"
                );
                GraphError::from(e)
            })?;

        debug!(
            alias = %session.connection(),
            session_id = session.session_id(),
            records = result.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );

        Ok(shape_output(result, policy.scrub_results))
    }
}

/// Normalize a raw result when the connection scrubs results, else pass it on.
pub(crate) fn shape_output(result: ResultSet, scrub_results: bool) -> QueryOutput {
    if scrub_results {
        QueryOutput::from_normalized(normalize_result_set(result))
    } else {
        QueryOutput::Raw(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GraphValue;

    #[test]
    fn test_shape_output_scrubbed() {
        let result = ResultSet::from_rows(vec!["n"], vec![vec![GraphValue::Integer(i64::MAX)]]);
        let out = shape_output(result, true);
        let rows = out.rows().unwrap();
        assert_eq!(rows[0]["n"], serde_json::json!("9223372036854775807"));
    }

    #[test]
    fn test_shape_output_empty_scrubbed_is_empty() {
        assert_eq!(shape_output(ResultSet::default(), true), QueryOutput::Empty);
    }

    #[test]
    fn test_shape_output_raw_untouched() {
        let result = ResultSet::from_rows(vec!["n"], vec![vec![GraphValue::Integer(1)]]);
        assert_eq!(shape_output(result.clone(), false), QueryOutput::Raw(result));
        assert_eq!(
            shape_output(ResultSet::default(), false),
            QueryOutput::Raw(ResultSet::default())
        );
    }
}
