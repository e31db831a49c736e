//! SQLite backend
//!
//! Used for local development and the test suites. Opens a connection per
//! call, the same lifecycle the SQL Server backend follows.

use crate::backend::{Backend, Dialect};
use crate::config::ConnectTimeouts;
use crate::error::{BackendError, DbError, FailureKind, Result};
use crate::types::{CellValue, RowSet, SqlParam};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};
use std::str::FromStr;

/// SQLite file backend
pub struct SqliteBackend {
    options: SqliteConnectOptions,
    timeouts: ConnectTimeouts,
}

impl SqliteBackend {
    /// Create a backend for a `sqlite://` URL or a plain file path.
    pub fn new(url: &str, timeouts: ConnectTimeouts) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbError::config(format!("Invalid SQLite URL: {e}")))?
            .busy_timeout(timeouts.query);

        Ok(Self { options, timeouts })
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch(&self, sql: &str, params: &[SqlParam]) -> std::result::Result<RowSet, BackendError> {
        let mut conn = tokio::time::timeout(self.timeouts.connect, self.options.connect())
            .await
            .map_err(|_| {
                BackendError::transient(format!(
                    "connection timed out after {}s",
                    self.timeouts.connect.as_secs()
                ))
            })?
            .map_err(|e| from_sqlx("connection failed", e))?;

        let result = run_query(&mut conn, sql, params).await;

        // Release the connection on success and failure alike
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Closing SQLite connection failed");
        }

        result
    }
}

async fn run_query(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[SqlParam],
) -> std::result::Result<RowSet, BackendError> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Text(s) => query.bind(s.clone()),
        };
    }

    let rows = query
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| from_sqlx("query execution failed", e))?;

    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(read_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(RowSet { columns, rows })
}

fn read_row(row: &SqliteRow) -> std::result::Result<Vec<CellValue>, BackendError> {
    (0..row.columns().len()).map(|i| read_cell(row, i)).collect()
}

/// Decode by the value's storage class rather than the declared column type,
/// since aggregate expressions have no declared type.
fn read_cell(row: &SqliteRow, index: usize) -> std::result::Result<CellValue, BackendError> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| from_sqlx("reading column failed", e))?;
    if raw.is_null() {
        return Ok(CellValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let decoded = match type_name.as_str() {
        "INTEGER" => row.try_get::<i64, _>(index).map(CellValue::Int),
        "REAL" | "NUMERIC" => row.try_get::<f64, _>(index).map(CellValue::Float),
        "BOOLEAN" => row.try_get::<bool, _>(index).map(CellValue::Bool),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|bytes| CellValue::Text(String::from_utf8_lossy(&bytes).into_owned())),
        _ => row.try_get::<String, _>(index).map(CellValue::Text),
    };

    decoded.map_err(|e| from_sqlx("decoding column failed", e))
}

/// Map a sqlx error to a classified backend error.
fn from_sqlx(context: &str, err: sqlx::Error) -> BackendError {
    BackendError {
        kind: classify(&err),
        message: format!("{context}: {err}"),
    }
}

/// I/O, pool and lock-contention failures are transient; everything else,
/// including SQL errors, is permanent.
pub(crate) fn classify(err: &sqlx::Error) -> FailureKind {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => FailureKind::Transient,
        sqlx::Error::Database(db) => {
            // SQLITE_BUSY (5) and SQLITE_LOCKED (6), extended codes included
            let primary = db
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff);
            match primary {
                Some(5) | Some(6) => FailureKind::Transient,
                _ => FailureKind::Permanent,
            }
        }
        _ => FailureKind::Permanent,
    }
}
