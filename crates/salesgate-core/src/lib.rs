//! Core types for the sales gateway
//!
//! Configuration loading and the shared error type used by every crate in the
//! workspace.

pub mod config;
pub mod error;

// Re-exports
pub use config::{
    AppConfig, BackendKind, DatabaseConfig, LogFormat, ObservabilityConfig, RetryConfig,
    ServerConfig,
};
pub use error::{Error, Result};
