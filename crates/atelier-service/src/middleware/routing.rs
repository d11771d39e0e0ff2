//! Routing-level responses in the standard error shape.
//!
//! - `require_integer_id` turns a non-integer `:id` into 404 before any
//!   permission check runs, so an unroutable path never reaches the gate.
//! - `json_method_not_allowed` replaces the router's empty 405 body with the
//!   standard error body, keeping the `Allow` header.
//! - `json_request_timeout` replaces the empty 408 produced when the request
//!   timeout elapses.

use crate::errors::ApiError;
use axum::{
    extract::{rejection::PathRejection, Path, Request},
    http::{header::ALLOW, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Reject requests whose `:id` segment is not a 64-bit integer.
pub async fn require_integer_id(
    id: Result<Path<i64>, PathRejection>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(rejection) = id {
        tracing::debug!(target: "atelier.middleware.routing", error = %rejection, "Non-integer id");
        return Err(ApiError::NotFound("Resource not found".to_string()));
    }

    Ok(next.run(request).await)
}

/// Render 405 responses as JSON errors.
pub async fn json_method_not_allowed(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut converted = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        converted.headers_mut().insert(ALLOW, allow);
    }
    converted
}

/// Render 408 responses as JSON errors.
///
/// Must sit outside the timeout layer to see the responses it produces.
pub async fn json_request_timeout(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }

    tracing::warn!(target: "atelier.middleware.routing", "Request timed out");
    ApiError::RequestTimeout.into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::Request as HttpRequest,
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;
    use tower_http::timeout::TimeoutLayer;

    async fn echo_id(Path(id): Path<i64>) -> String {
        id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/artists/:id",
                get(echo_id).route_layer(middleware::from_fn(require_integer_id)),
            )
            .layer(middleware::from_fn(json_method_not_allowed))
    }

    async fn send(method: &str, uri: &str) -> Response {
        app()
            .oneshot(
                HttpRequest::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_integer_id_passes_through() {
        let response = send("GET", "/artists/42").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "42");
    }

    #[tokio::test]
    async fn test_non_integer_id_is_404() {
        for uri in ["/artists/abc", "/artists/1.5", "/artists/99999999999999999999"] {
            let response = send("GET", uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body_json(response).await["code"], "not_found");
        }
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_json_with_allow() {
        let response = send("PUT", "/artists/1").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let allow = response.headers().get(ALLOW).unwrap().to_str().unwrap();
        assert!(allow.contains("GET"));

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 405);
        assert_eq!(body["code"], "method_not_allowed");
    }

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "done"
    }

    fn timeout_app() -> Router {
        Router::new()
            .route("/slow", get(slow))
            .route("/fast", get(|| async { "ok" }))
            .layer(TimeoutLayer::new(Duration::from_millis(20)))
            .layer(middleware::from_fn(json_request_timeout))
    }

    async fn send_timeout_app(uri: &str) -> Response {
        timeout_app()
            .oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_elapsed_timeout_is_json() {
        let response = send_timeout_app("/slow").await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 408);
        assert_eq!(body["code"], "request_timeout");
        assert_eq!(body["message"], "Request timed out");
    }

    #[tokio::test]
    async fn test_timeout_passes_through_fast_responses() {
        let response = send_timeout_app("/fast").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "ok");
    }
}
