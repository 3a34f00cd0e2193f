//! Prometheus metrics middleware and earnings counters.

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::{EarningsSnapshot, FailureKind, IntegrityWarning};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Middleware to record HTTP request metrics.
///
/// Records the following metrics:
/// - `http_requests_total`: Counter with labels (method, path, status)
/// - `http_request_duration_seconds`: Histogram with labels (method, path)
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_label(req.method());
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Bounded set of method labels.
fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

fn failure_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Input => "input",
        FailureKind::Fetch => "fetch",
        FailureKind::Timeout => "timeout",
    }
}

/// Count a computed snapshot, its failure and its integrity warnings.
pub fn record_snapshot(snapshot: &EarningsSnapshot, source: &'static str) {
    match snapshot.status.failure() {
        Some(failure) => counter!(
            "earnings_snapshots_failed_total",
            "source" => source,
            "kind" => failure_label(failure.kind)
        )
        .increment(1),
        None => counter!("earnings_snapshots_computed_total", "source" => source).increment(1),
    }
    record_integrity_warnings(&snapshot.warnings);
}

pub fn record_integrity_warnings(warnings: &[IntegrityWarning]) {
    for warning in warnings {
        counter!("earnings_integrity_warnings_total", "type" => warning.kind()).increment(1);
    }
}

pub fn record_export(rows: usize, failed: bool) {
    if failed {
        counter!("earnings_exports_failed_total").increment(1);
    } else {
        counter!("earnings_exports_total").increment(1);
        histogram!("earnings_export_rows").record(rows as f64);
    }
}

pub fn record_live_session(delta: f64) {
    metrics::gauge!("earnings_live_sessions").increment(delta);
}

/// Handler for /metrics endpoint that returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

/// Install the global Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 30.0])?
        .install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}
