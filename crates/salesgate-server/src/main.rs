//! Sales gateway server
//!
//! ```bash
//! SQL_CONNECTION_STRING="Server=tcp:db.example.net,1433;Database=sales;User ID=reports;Password=..." \
//!     cargo run -p salesgate-server --features odbc
//!
//! curl -X POST http://127.0.0.1:8080/sql/sales/regions -d '{"region_name":"North"}'
//! ```

use anyhow::{Context, Result};
use salesgate_core::AppConfig;
use salesgate_db::{connect_backend, Catalog, QueryExecutor, RetryPolicy};
use salesgate_server::{create_router, AppState};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    salesgate_telemetry::init_telemetry(&config.observability);

    let backend = connect_backend(&config).context("Failed to initialize database backend")?;
    let catalog = Catalog::new(backend.dialect());
    let executor = QueryExecutor::new(backend, RetryPolicy::from(&config.retry));

    let shutdown = CancellationToken::new();
    let state = AppState::new(catalog, executor)
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs))
        .with_shutdown(shutdown.clone());
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        backend = ?config.database.backend,
        reports = catalog.reports().len(),
        "Sales gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server failed")?;

    tracing::info!("Sales gateway stopped");
    Ok(())
}

/// Resolve on Ctrl+C and cancel every in-flight request.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
    shutdown.cancel();
}
