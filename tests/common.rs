//! Common test utilities and helpers
//!
//! Included by the integration tests via `mod common;`.

#![allow(dead_code)]

use anyhow::Result;
use axum::Router;
use salesgate_core::AppConfig;
use salesgate_db::testing::seed_sales_database;
use salesgate_db::{connect_backend, Catalog, QueryExecutor, RetryPolicy};
use salesgate_server::{create_router, AppState};
use std::path::Path;

/// Configuration pointing at a SQLite database, built the same way the
/// server binary builds its own.
pub fn sqlite_config(url: &str) -> Result<AppConfig> {
    let url = url.to_string();
    Ok(AppConfig::from_sources(None, move |key| match key {
        "SALESGATE_BACKEND" => Some("sqlite".to_string()),
        "SQL_CONNECTION_STRING" => Some(url.clone()),
        _ => None,
    })?)
}

/// Seed a sales database under `dir` and build the full router over it.
pub async fn seeded_router(dir: &Path) -> Result<Router> {
    let url = seed_sales_database(dir).await?;
    let config = sqlite_config(&url)?;

    let backend = connect_backend(&config)?;
    let catalog = Catalog::new(backend.dialect());
    let executor = QueryExecutor::new(backend, RetryPolicy::from(&config.retry));

    Ok(create_router(AppState::new(catalog, executor)))
}
