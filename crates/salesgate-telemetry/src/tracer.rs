//! Tracer setup and management

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::TracerProvider;
use salesgate_core::{LogFormat, ObservabilityConfig};
use std::sync::{Arc, OnceLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the provider alive for the life of the process
static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Initialize logging and OpenTelemetry tracing.
///
/// This sets up:
/// - A tracer provider named after the configured service
/// - Integration with the tracing subscriber
/// - Structured logging output, human readable or JSON
///
/// `RUST_LOG` wins over `observability.log_level` when set. Calling this more
/// than once keeps the first subscriber and returns `false`.
///
/// # Example
///
/// ```rust,no_run
/// use salesgate_core::ObservabilityConfig;
/// use salesgate_telemetry::init_telemetry;
///
/// init_telemetry(&ObservabilityConfig::default());
/// ```
pub fn init_telemetry(config: &ObservabilityConfig) -> bool {
    let tracer_provider = TracerProvider::builder().build();
    let tracer = tracer_provider.tracer(config.service_name.clone());

    let _ = TRACER_PROVIDER.set(Arc::new(tracer_provider));

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .is_ok()
}
