//! Database backends
//!
//! A backend owns the connection lifecycle of a single call: it opens a
//! connection, runs one statement, reads every row and releases the
//! connection before returning, whatever the outcome.

#[cfg(feature = "odbc")]
pub mod odbc;
pub mod sqlite;

use crate::config::ConnectTimeouts;
use crate::connection::normalize_for_driver;
use crate::error::{BackendError, DbError, Result};
use crate::types::{RowSet, SqlParam};
use async_trait::async_trait;
use salesgate_core::{AppConfig, BackendKind};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// SQL dialect spoken by a backend. The report catalog keeps one SQL text
/// per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    SqlServer,
    Sqlite,
}

impl Dialect {
    /// Value for the `db.system` span attribute
    pub fn db_system(&self) -> &'static str {
        match self {
            Dialect::SqlServer => "mssql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl From<BackendKind> for Dialect {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::SqlServer => Dialect::SqlServer,
            BackendKind::Sqlite => Dialect::Sqlite,
        }
    }
}

/// Executes one parameterized statement on a fresh connection.
#[async_trait]
pub trait Backend: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Run `sql` with positional `params`.
    ///
    /// Statements that produce no result set return an empty [`RowSet`].
    async fn fetch(&self, sql: &str, params: &[SqlParam]) -> std::result::Result<RowSet, BackendError>;
}

/// Build the backend named by the configuration.
///
/// For SQL Server the raw connection string is normalized here, once, and
/// the masked form is logged.
pub fn connect_backend(config: &AppConfig) -> Result<Arc<dyn Backend>> {
    let timeouts = ConnectTimeouts::from(&config.database);
    let raw = config.connection_string.expose_secret();

    match config.database.backend {
        BackendKind::Sqlite => {
            tracing::info!(url = %raw, "Using SQLite backend");
            Ok(Arc::new(sqlite::SqliteBackend::new(raw, timeouts)?))
        }
        BackendKind::SqlServer => {
            let normalized = normalize_for_driver(raw, &config.database.odbc_driver)?;
            tracing::info!(connection = %normalized, "Using SQL Server backend");
            sql_server_backend(normalized, timeouts)
        }
    }
}

#[cfg(feature = "odbc")]
fn sql_server_backend(
    normalized: crate::connection::NormalizedConnectionConfig,
    timeouts: ConnectTimeouts,
) -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(odbc::OdbcBackend::new(normalized, timeouts)?))
}

#[cfg(not(feature = "odbc"))]
fn sql_server_backend(
    _normalized: crate::connection::NormalizedConnectionConfig,
    _timeouts: ConnectTimeouts,
) -> Result<Arc<dyn Backend>> {
    Err(DbError::config(
        "SQL Server backend requires building salesgate-db with the `odbc` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(backend: &str, conn: &str) -> AppConfig {
        let backend = backend.to_string();
        let conn = conn.to_string();
        AppConfig::from_sources(None, move |key| match key {
            "SALESGATE_BACKEND" => Some(backend.clone()),
            "SQL_CONNECTION_STRING" => Some(conn.clone()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!(Dialect::SqlServer.db_system(), "mssql");
        assert_eq!(Dialect::from(BackendKind::Sqlite), Dialect::Sqlite);
    }

    #[test]
    fn test_sql_server_config_errors_surface() {
        let config = config_with("sqlserver", "Database=only");
        assert!(matches!(connect_backend(&config), Err(DbError::Config(_))));
    }

    #[cfg(not(feature = "odbc"))]
    #[test]
    fn test_sql_server_requires_odbc_feature() {
        let config = config_with("sqlserver", "Server=x;Database=y");
        let err = connect_backend(&config).err().unwrap();
        assert!(err.to_string().contains("odbc"));
    }

    #[test]
    fn test_sqlite_backend_from_config() {
        let config = config_with("sqlite", "sqlite://sales.db");
        let backend = connect_backend(&config).unwrap();
        assert_eq!(backend.dialect(), Dialect::Sqlite);
    }
}
