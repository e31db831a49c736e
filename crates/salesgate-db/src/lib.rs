//! Report database access for the sales gateway
//!
//! This crate turns a generic connection string into the ODBC dialect,
//! executes the fixed report queries with bounded retry, and converts result
//! rows into JSON-safe records.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod schema;
pub mod testing;
pub mod types;

// Re-exports
pub use backend::{connect_backend, Backend, Dialect};
pub use catalog::{
    BoundQuery, Catalog, DatabaseInfo, FunctionInfo, ParamKind, ParamSlot, Period, QuerySpec,
    ReportRequest, DEFAULT_TOP_CUSTOMERS, MAX_LIMIT,
};
pub use config::{ConnectTimeouts, RetryPolicy};
pub use connection::{normalize, Authentication, ConnectionConfig, NormalizedConnectionConfig};
pub use error::{BackendError, DbError, FailureKind, Result};
pub use executor::{Execution, QueryExecutor};
pub use schema::{ColumnInfo, TableInfo};
pub use types::{CellValue, ResultRow, RowSet, SqlParam};
