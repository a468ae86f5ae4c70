//! # IoTMap Telemetry and Monitoring
//!
//! Crate for logging and metrics of the modelling runs.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
