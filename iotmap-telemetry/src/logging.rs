//! ## iotmap-telemetry::logging
//! **Structured logging with tracing**
//!
//! Initializes the fmt subscriber with an `RUST_LOG`-style filter and
//! provides a helper for span-scoped modelling events with OpenTelemetry
//! key/values.

use opentelemetry::KeyValue;
use tracing::info_span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    pub fn init() {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_span_events(FmtSpan::ENTER)
            .init()
    }

    /// Emit one structured modelling event inside its own span.
    pub fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!("modelling_event", event_type = event_type);
        span.in_scope(|| {
            tracing::info!(metadata = ?metadata, "Modelling event occurred");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        EventLogger::log_event("test", vec![KeyValue::new("key", "value")]);
        assert!(logs_contain("Modelling event occurred"));
    }
}
