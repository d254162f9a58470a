//! Tracing spans, subscriber setup and OpenTelemetry metrics for the A2A runtime.

pub mod metrics;
pub mod spans;
pub mod tracing_setup;
