use crate::types::*;
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use salesgate_db::connection::mask_password;
use salesgate_db::{Catalog, QueryExecutor, ReportRequest};
use salesgate_telemetry::attributes::{REPORT_ATTEMPTS, REPORT_ROW_COUNT};
use salesgate_telemetry::{report_span, ReportSpanAttributes};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Instrument, Level};

/// Shared, read-only state computed once at startup
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub executor: QueryExecutor,
    /// Upper bound on one report request, retries included
    pub request_timeout: Duration,
    /// Cancelled on server shutdown; every request runs under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(catalog: Catalog, executor: QueryExecutor) -> Self {
        Self {
            catalog,
            executor,
            request_timeout: Duration::from_secs(120),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoints
        .route("/health", get(health_check))
        .route("/readiness", get(readiness_check))
        // Report endpoints
        .route("/sql/sales/regions", post(sales_by_region))
        .route("/sql/sales/by-category", post(sales_by_category))
        .route("/sql/sales/by-channel", post(sales_by_channel))
        .route("/sql/customers/top", post(top_customers))
        .route("/sql/products/performance", post(product_performance))
        .route("/sql/sales/products", post(product_sales))
        .route("/sql/sales/customers", post(customer_sales))
        .route("/sql/sales/time-series", post(sales_over_time))
        // Middleware layers (applied in reverse order)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Health check endpoint - returns OK if the service is running
async fn health_check() -> impl IntoResponse {
    tracing::debug!("Health check requested");
    (StatusCode::OK, "OK")
}

/// Readiness check endpoint - runs a trivial statement against the database
async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Readiness check requested");

    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();
    match state.executor.execute("SELECT 1", &[], &cancel).await {
        Ok(_) => (StatusCode::OK, "READY"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}

async fn sales_by_region(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReportsResponse>, AppError> {
    let request = parse_request::<RegionSalesRequest>(&body)?;
    run_report(&state, request, "Error getting sales by region").await
}

async fn sales_by_category(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReportsResponse>, AppError> {
    decode_body::<NoParamsRequest>(&body)?;
    run_report(&state, ReportRequest::SalesByCategory, "Error getting sales by category").await
}

async fn sales_by_channel(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReportsResponse>, AppError> {
    decode_body::<NoParamsRequest>(&body)?;
    run_report(&state, ReportRequest::SalesByChannel, "Error getting sales by channel").await
}

async fn top_customers(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReportsResponse>, AppError> {
    let request = parse_request::<TopCustomersRequest>(&body)?;
    run_report(&state, request, "Error getting top customers").await
}

async fn product_performance(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReportsResponse>, AppError> {
    decode_body::<NoParamsRequest>(&body)?;
    run_report(
        &state,
        ReportRequest::ProductPerformance,
        "Error getting product performance",
    )
    .await
}

async fn product_sales(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReportsResponse>, AppError> {
    let request = parse_request::<ProductSalesRequest>(&body)?;
    run_report(&state, request, "Error getting product sales").await
}

async fn customer_sales(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReportsResponse>, AppError> {
    let request = parse_request::<CustomerSalesRequest>(&body)?;
    run_report(&state, request, "Error getting customer sales").await
}

async fn sales_over_time(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReportsResponse>, AppError> {
    let request = parse_request::<SalesOverTimeRequest>(&body)?;
    run_report(&state, request, "Error getting sales over time").await
}

/// Decode a request body. An empty body is the same as `{}`.
fn decode_body<T>(body: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice::<T>(body).map_err(|e| AppError::invalid_body(e.to_string()))
}

/// Decode and validate a request body into a catalog request.
fn parse_request<T>(body: &[u8]) -> Result<ReportRequest, AppError>
where
    T: DeserializeOwned + Default + IntoReport,
{
    decode_body::<T>(body)?
        .into_report()
        .map_err(AppError::invalid_body)
}

/// Plan, execute and wrap one report.
///
/// The request's cancellation token is a child of the shutdown token and is
/// cancelled when this future is dropped, e.g. on client disconnect.
async fn run_report(
    state: &AppState,
    request: ReportRequest,
    summary: &'static str,
) -> Result<Json<ReportsResponse>, AppError> {
    let query = state
        .catalog
        .plan(&request)
        .map_err(|e| AppError::new(summary, e))?;

    let span = report_span(ReportSpanAttributes {
        report_name: query.report.to_string(),
        db_system: state.catalog.dialect().db_system().to_string(),
        parameter_count: query.params.len(),
    });

    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let execution = async {
        tokio::time::timeout(state.request_timeout, state.executor.run(&query, &cancel)).await
    }
    .instrument(span.clone())
    .await
    .map_err(|_| {
        AppError::new(
            summary,
            anyhow::anyhow!(
                "request timed out after {}s",
                state.request_timeout.as_secs()
            ),
        )
    })?
    .map_err(|e| AppError::new(summary, e))?;

    span.record(REPORT_ROW_COUNT, execution.rows.len());
    span.record(REPORT_ATTEMPTS, execution.attempts);
    tracing::info!(
        parent: &span,
        rows = execution.rows.len(),
        attempts = execution.attempts,
        "Report completed"
    );

    Ok(Json(ReportsResponse {
        results: execution.rows,
    }))
}

// Error handling
pub struct AppError {
    summary: &'static str,
    cause: anyhow::Error,
}

impl AppError {
    pub fn new(summary: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            summary,
            cause: cause.into(),
        }
    }

    fn invalid_body(details: String) -> Self {
        Self::new("Invalid request body", anyhow::Error::msg(details))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = mask_password(&self.cause.to_string());
        tracing::error!(error = self.summary, cause = ?self.cause, "Request failed");

        let body = ErrorResponse {
            error: self.summary.to_string(),
            details,
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
