//! Request metrics for the matrix service.
//!
//! Metrics are emitted as structured tracing events under the
//! `component_matrix::metrics` target, one event per observation, so a
//! log-based metrics pipeline can derive counters and histograms from
//! them:
//!
//! - `request_metric`: one per HTTP request, with normalized path,
//!   method, status and latency
//! - `resolution_metric`: one per matrix resolution, with version count
//! - `policy_change_metric`: one per applied policy change, with edit
//!   count

use std::sync::OnceLock;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;

/// Layer that emits one `request_metric` event per served request.
///
/// Paths are normalized before logging so cluster and component names do
/// not explode the metric's cardinality.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    info!(
        target: "component_matrix::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request_metric"
    );

    response
}

// Collapses the dynamic cluster and component segments of the API paths
// to `:name` placeholders.
fn normalize_path(path: &str) -> String {
    static SEGMENTS: OnceLock<regex_lite::Regex> = OnceLock::new();
    let segments = SEGMENTS
        .get_or_init(|| regex_lite::Regex::new(r"/(clusters|components)/[^/]+").unwrap());
    segments.replace_all(path, "/$1/:name").to_string()
}

/// Emit one `resolution_metric` event for a completed matrix resolution.
pub fn record_resolution_metrics(version_count: usize, latency_ms: u64) {
    info!(
        target: "component_matrix::metrics",
        metric_type = "resolution",
        version_count = version_count,
        latency_ms = latency_ms,
        "resolution_metric"
    );
}

/// Emit one `policy_change_metric` event for an applied policy change.
pub fn record_policy_change(edit_count: usize, latency_ms: u64) {
    info!(
        target: "component_matrix::metrics",
        metric_type = "policy_change",
        edit_count = edit_count,
        latency_ms = latency_ms,
        "policy_change_metric"
    );
}
