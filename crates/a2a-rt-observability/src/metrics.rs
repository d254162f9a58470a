//! OpenTelemetry metrics helpers.
//!
//! Metrics are defined here to keep instrumentation orthogonal to the runtime.

use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::{KeyValue, global};
use std::sync::OnceLock;
use std::time::Duration;

const METER_NAME: &str = "a2a_rt";

static MESSAGE_COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
static MESSAGE_HISTOGRAM: OnceLock<Histogram<f64>> = OnceLock::new();
static REQUEST_COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
static REQUEST_HISTOGRAM: OnceLock<Histogram<f64>> = OnceLock::new();
static ERROR_COUNTER: OnceLock<Counter<u64>> = OnceLock::new();

fn message_counter() -> &'static Counter<u64> {
    MESSAGE_COUNTER.get_or_init(|| {
        global::meter(METER_NAME)
            .u64_counter("a2a_rt.message.handled_total")
            .init()
    })
}

fn message_histogram() -> &'static Histogram<f64> {
    MESSAGE_HISTOGRAM.get_or_init(|| {
        global::meter(METER_NAME)
            .f64_histogram("a2a_rt.message.handle_duration_ms")
            .init()
    })
}

fn request_counter() -> &'static Counter<u64> {
    REQUEST_COUNTER.get_or_init(|| {
        global::meter(METER_NAME)
            .u64_counter("a2a_rt.request.sent_total")
            .init()
    })
}

fn request_histogram() -> &'static Histogram<f64> {
    REQUEST_HISTOGRAM.get_or_init(|| {
        global::meter(METER_NAME)
            .f64_histogram("a2a_rt.request.duration_ms")
            .init()
    })
}

fn error_counter() -> &'static Counter<u64> {
    ERROR_COUNTER.get_or_init(|| {
        global::meter(METER_NAME)
            .u64_counter("a2a_rt.error_total")
            .init()
    })
}

/// Record completion of an inbound message dispatch.
pub fn record_message_handled(intent: &str, result: &str, duration: Duration) {
    let attributes = &[
        KeyValue::new("intent", intent.to_string()),
        KeyValue::new("result", result.to_string()),
    ];
    message_counter().add(1, attributes);
    message_histogram().record(duration.as_millis() as f64, attributes);
}

/// Record completion of an outbound request.
pub fn record_request(to_agent_type: &str, intent: &str, result: &str, duration: Duration) {
    let attributes = &[
        KeyValue::new("to", to_agent_type.to_string()),
        KeyValue::new("intent", intent.to_string()),
        KeyValue::new("result", result.to_string()),
    ];
    request_counter().add(1, attributes);
    request_histogram().record(duration.as_millis() as f64, attributes);
}

/// Record an error envelope or failed request by protocol code.
pub fn record_error(intent: &str, code: &str) {
    let attributes = &[
        KeyValue::new("intent", intent.to_string()),
        KeyValue::new("code", code.to_string()),
    ];
    error_counter().add(1, attributes);
}
