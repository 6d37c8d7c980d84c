//! Telemetry
//!
//! Request-layer counters. Logging goes through `tracing` at the call sites.

pub mod metrics;

pub use metrics::{ClientMetrics, MetricsSnapshot};
