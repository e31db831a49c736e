//! # Sales Gateway Telemetry
//!
//! Structured logging and OpenTelemetry tracing for the report endpoints.
//!
//! Report executions are recorded as spans carrying the report name, backend
//! dialect and outcome, so a slow or failing report can be followed from the
//! HTTP layer down to the retry loop.

mod spans;
mod tracer;

pub use spans::{report_span, ReportSpanAttributes};
pub use tracer::init_telemetry;

/// Span attribute names used by the report spans.
pub mod attributes {
    pub const DB_SYSTEM: &str = "db.system";
    pub const DB_OPERATION_NAME: &str = "db.operation.name";
    pub const DB_QUERY_PARAMETER_COUNT: &str = "db.query.parameter_count";

    pub const REPORT_NAME: &str = "salesgate.report.name";
    pub const REPORT_ROW_COUNT: &str = "salesgate.report.row_count";
    pub const REPORT_ATTEMPTS: &str = "salesgate.report.attempts";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_constants() {
        assert_eq!(attributes::DB_SYSTEM, "db.system");
        assert_eq!(attributes::REPORT_NAME, "salesgate.report.name");
        assert_eq!(attributes::REPORT_ATTEMPTS, "salesgate.report.attempts");
    }
}
