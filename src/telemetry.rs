use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize structured logging for the process. JSON output with span
/// context so every governance decision can be correlated after the fact.
pub fn init_telemetry() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("boardroom telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span carrying the common governance attributes: which operation,
/// against which document, on whose behalf.
pub fn governance_span(operation: &str, document: &str, principal: &str) -> tracing::Span {
    let correlation_id = generate_correlation_id();
    tracing::info_span!(
        "governance",
        operation = operation,
        document.id = document,
        principal = principal,
        correlation.id = correlation_id.as_str(),
        otel.kind = "internal"
    )
}

/// Shutdown telemetry gracefully
pub fn shutdown_telemetry() {
    tracing::info!("boardroom telemetry shutdown complete");
}
