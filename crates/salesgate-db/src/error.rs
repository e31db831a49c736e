//! Error types for report execution

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Errors surfaced to callers of the normalizer, catalog and executor.
#[derive(Error, Debug)]
pub enum DbError {
    /// Bad or missing connection configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Arguments do not fit the report's declared parameter slots
    #[error("Parameter mismatch for report '{report}': {reason}")]
    ParameterMismatch { report: String, reason: String },

    #[error("Unknown report: {0}")]
    UnknownReport(String),

    /// Execution failed, after retries when the failure was transient
    #[error("Database error after {attempts} attempt(s): {source}")]
    Database {
        attempts: u32,
        #[source]
        source: BackendError,
    },

    /// The caller cancelled the request while a query or retry was pending
    #[error("Query cancelled")]
    Cancelled,
}

impl DbError {
    pub fn config(msg: impl Into<String>) -> Self {
        DbError::Config(msg.into())
    }

    pub fn parameter_mismatch(report: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::ParameterMismatch {
            report: report.into(),
            reason: reason.into(),
        }
    }
}

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connectivity, I/O, timeouts, lock contention
    Transient,
    /// Syntax, constraint, schema or decoding problems
    Permanent,
}

/// A single failed backend call.
#[derive(Debug, Clone)]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {}

/// Classify an ODBC SQLSTATE.
///
/// Class 08 (connection exception), driver timeouts and SQL Server's
/// deadlock-victim and service-busy states are transient.
pub fn classify_sqlstate(state: &str) -> FailureKind {
    match state {
        s if s.starts_with("08") => FailureKind::Transient,
        "HYT00" | "HYT01" | "40001" | "40501" | "40613" => FailureKind::Transient,
        _ => FailureKind::Permanent,
    }
}
