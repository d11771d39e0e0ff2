//! Prometheus metrics endpoint handler.
//!
//! Unauthenticated so Prometheus can scrape it. Labels carry no token
//! material and have bounded cardinality.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns 200 OK with Prometheus text format:
/// ```text
/// # TYPE atelier_http_requests_total counter
/// atelier_http_requests_total{method="GET",endpoint="/artists",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "atelier.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
