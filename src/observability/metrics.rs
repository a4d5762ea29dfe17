//! Metrics collection and exposition.
//!
//! # Metrics
//! - `trellis_dispatch_total` (counter): requests by method and outcome
//! - `trellis_dispatch_duration_seconds` (histogram): dispatch latency by outcome
//! - `trellis_template_loads_total` (counter): template loads by result (hit, miss, uncached)
//! - `trellis_renders_total` (counter): render calls by body kind
//!
//! # Design Decisions
//! - Without an installed exporter every call is a no-op
//! - Labels are static strings to keep cardinality bounded

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter serving on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Label for a request method. Extension methods collapse into `other`.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::PATCH => "PATCH",
        Method::DELETE => "DELETE",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "other",
    }
}

/// Record one dispatched request.
pub fn record_dispatch(method: &'static str, outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!(
        "trellis_dispatch_total",
        "method" => method,
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!("trellis_dispatch_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

/// Record a template load served from the cache or compiled.
pub fn record_template_load(result: &'static str) {
    ::metrics::counter!("trellis_template_loads_total", "result" => result).increment(1);
}

/// Record a render call by body kind.
pub fn record_render(kind: &'static str) {
    ::metrics::counter!("trellis_renders_total", "kind" => kind).increment(1);
}
