//! Query execution with bounded retry

use crate::backend::{Backend, Dialect};
use crate::catalog::BoundQuery;
use crate::config::RetryPolicy;
use crate::error::{DbError, Result};
use crate::types::{ResultRow, SqlParam};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Rows produced by a successful run, with the number of attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub rows: Vec<ResultRow>,
    pub attempts: u32,
}

/// Runs statements against a backend, retrying transient failures.
///
/// Holds no connection of its own; each attempt asks the backend for a
/// fresh one. Cheap to clone and share across requests.
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn Backend>,
    policy: RetryPolicy,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn Backend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn dialect(&self) -> Dialect {
        self.backend.dialect()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Execute `sql` with positional `params` and return the materialized rows.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[SqlParam],
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRow>> {
        self.execute_counted(sql, params, cancel)
            .await
            .map(|execution| execution.rows)
    }

    /// Execute a catalog-bound query.
    pub async fn run(&self, query: &BoundQuery, cancel: &CancellationToken) -> Result<Execution> {
        tracing::debug!(report = query.report, params = query.params.len(), "Running report query");
        self.execute_counted(&query.sql, &query.params, cancel).await
    }

    async fn execute_counted(
        &self,
        sql: &str,
        params: &[SqlParam],
        cancel: &CancellationToken,
    ) -> Result<Execution> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DbError::Cancelled),
                outcome = self.backend.fetch(sql, params) => outcome,
            };

            let error = match outcome {
                Ok(rows) => {
                    return Ok(Execution {
                        rows: rows.into_result_rows(),
                        attempts: attempt,
                    });
                }
                Err(e) => e,
            };

            if !error.is_transient() || attempt >= max_attempts {
                tracing::error!(
                    attempt,
                    max_attempts,
                    kind = ?error.kind,
                    error = %error,
                    "Query failed"
                );
                return Err(DbError::Database {
                    attempts: attempt,
                    source: error,
                });
            }

            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = self.policy.delay.as_millis() as u64,
                error = %error,
                "Query attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DbError::Cancelled),
                _ = tokio::time::sleep(self.policy.delay) => {}
            }
        }
    }
}
