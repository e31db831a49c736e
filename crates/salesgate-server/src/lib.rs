//! HTTP surface of the sales gateway
//!
//! One POST endpoint per report plus health and readiness probes. Every
//! response is either `{"results": [...]}` or `{"error": ..., "details": ...}`.

pub mod rest;
pub mod types;

pub use rest::{create_router, AppError, AppState};
pub use types::*;
