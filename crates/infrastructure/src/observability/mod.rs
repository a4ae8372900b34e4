//! Observability module
//!
//! Job scheduling metrics and Prometheus exporter setup. Structured logging is
//! initialized by the binary through `tracing-subscriber`.

pub mod metrics_collector;
pub mod telemetry_setup;

pub use metrics_collector::MetricsCollector;
pub use telemetry_setup::init_metrics;
