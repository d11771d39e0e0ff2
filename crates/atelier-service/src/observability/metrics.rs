//! Metrics definitions for the Atelier service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `atelier_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: the standard HTTP methods plus `OTHER`
//! - `endpoint`: the route templates plus `/other`
//! - `status`: 3 values (success, error, timeout)
//! - `permission`: the permission strings bound in the router
//! - `outcome`: `authorized` or an `AuthError` code
//! - `operation`: bounded by repository code

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("atelier_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("atelier_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `atelier_http_requests_total`, `atelier_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_method = normalize_method(method);
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("atelier_http_request_duration_seconds",
        "method" => normalized_method,
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("atelier_http_requests_total",
        "method" => normalized_method,
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Collapse extension and custom methods into `OTHER`.
fn normalize_method(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "OPTIONS" => "OPTIONS",
        _ => "OTHER",
    }
}

/// Map a request path onto its route template.
///
/// Anything that is not a known route becomes `/other`. Id segments are only
/// collapsed when they are integers, matching what the router accepts.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/authorization/url" => "/authorization/url",
        "/artists" => "/artists",
        "/videos" => "/videos",
        "/add-videos" => "/add-videos",
        _ => normalize_dynamic_endpoint(path),
    }
}

fn normalize_dynamic_endpoint(path: &str) -> &'static str {
    let is_id = |segment: &str| !segment.is_empty() && segment.parse::<i64>().is_ok();

    if let Some(id) = path.strip_prefix("/artists/") {
        if is_id(id) {
            return "/artists/{id}";
        }
    }
    if let Some(id) = path.strip_prefix("/videos/") {
        if is_id(id) {
            return "/videos/{id}";
        }
    }

    "/other"
}

// ============================================================================
// Authorization Metrics
// ============================================================================

/// Record a gate decision.
///
/// Metric: `atelier_auth_decisions_total`
/// Labels: `permission`, `outcome` (`authorized` or an `AuthError` code)
pub fn record_auth_decision(permission: &str, outcome: &'static str) {
    counter!("atelier_auth_decisions_total",
        "permission" => permission.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a JWKS fetch attempt.
///
/// Metric: `atelier_jwks_fetches_total`
/// Labels: `status` ("success" or "error")
pub fn record_jwks_fetch(status: &'static str) {
    counter!("atelier_jwks_fetches_total", "status" => status).increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution
///
/// Metric: `atelier_db_query_duration_seconds`, `atelier_db_queries_total`
/// Labels: `operation`, `status`
///
/// Operations: list_artists, get_artist, create_artist, update_artist,
/// delete_artist and their video counterparts.
pub fn record_db_query(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("atelier_db_query_duration_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());

    counter!("atelier_db_queries_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests execute the recording functions against the global no-op
    // recorder; values are not inspected.

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/artists", 200, Duration::from_millis(5));
        record_http_request("POST", "/artists", 401, Duration::from_millis(2));
        record_http_request("PATCH", "/videos/12", 403, Duration::from_millis(3));
        record_http_request("DELETE", "/videos/abc", 404, Duration::from_millis(1));
        record_http_request("GET", "/artists", 504, Duration::from_secs(30));
        record_http_request("PROPFIND", "/artists", 405, Duration::from_millis(1));
    }

    #[test]
    fn test_normalize_method() {
        for method in ["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"] {
            assert_eq!(normalize_method(method), method);
        }
        assert_eq!(normalize_method("PROPFIND"), "OTHER");
        assert_eq!(normalize_method("TRACE"), "OTHER");
        assert_eq!(normalize_method("get"), "OTHER");
        assert_eq!(normalize_method("X-RANDOM-1234"), "OTHER");
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(400), "error");
        assert_eq!(categorize_status_code(401), "error");
        assert_eq!(categorize_status_code(500), "error");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
    }

    #[test]
    fn test_normalize_endpoint_known_paths() {
        assert_eq!(normalize_endpoint("/"), "/");
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/ready"), "/ready");
        assert_eq!(
            normalize_endpoint("/authorization/url"),
            "/authorization/url"
        );
        assert_eq!(normalize_endpoint("/artists"), "/artists");
        assert_eq!(normalize_endpoint("/add-videos"), "/add-videos");
    }

    #[test]
    fn test_normalize_endpoint_id_paths() {
        assert_eq!(normalize_endpoint("/artists/1"), "/artists/{id}");
        assert_eq!(normalize_endpoint("/videos/987654"), "/videos/{id}");
    }

    #[test]
    fn test_normalize_endpoint_unknown_paths() {
        assert_eq!(normalize_endpoint("/artists/abc"), "/other");
        assert_eq!(normalize_endpoint("/artists/"), "/other");
        assert_eq!(normalize_endpoint("/videos/1/extra"), "/other");
        assert_eq!(normalize_endpoint("/admin"), "/other");
    }

    #[test]
    fn test_record_auth_and_jwks() {
        record_auth_decision("delete:artist", "authorized");
        record_auth_decision("post:video", "forbidden");
        record_jwks_fetch("success");
        record_jwks_fetch("error");
    }

    #[test]
    fn test_record_db_query() {
        record_db_query("list_artists", "success", Duration::from_millis(3));
        record_db_query("delete_video", "error", Duration::from_millis(9));
    }
}
