//! Permission middleware for privileged routes.
//!
//! `require_permission` runs the [`AuthGate`] for the permission bound to the
//! route and, on success, stores the verified [`Claims`] in request
//! extensions before calling the wrapped handler. Any denial short-circuits
//! into the standard error response.
//!
//! ```rust,ignore
//! let guard = PermissionGuard::new(gate.clone(), "delete:artist");
//! let route = delete(handlers::delete_artist)
//!     .route_layer(middleware::from_fn_with_state(guard, require_permission));
//! ```

use crate::auth::{AuthGate, Claims};
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// Middleware state: the gate plus the permission this route requires.
#[derive(Clone)]
pub struct PermissionGuard {
    pub gate: Arc<AuthGate>,
    pub permission: &'static str,
}

impl PermissionGuard {
    pub fn new(gate: Arc<AuthGate>, permission: &'static str) -> Self {
        Self { gate, permission }
    }
}

/// Authorize the request for the guard's permission.
///
/// # Response
///
/// - 401/400/403 in the standard error shape if the gate denies the request
/// - Continues to next handler with `Claims` in extensions otherwise
#[instrument(skip_all, name = "atelier.middleware.auth", fields(permission = guard.permission))]
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // A header that is not visible ASCII cannot carry a bearer token and is
    // treated the same as no header.
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let claims = guard
        .gate
        .authorize(authorization, guard.permission)
        .await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extension trait for extracting claims from request.
pub trait ClaimsExt {
    /// Get the verified claims from request extensions.
    ///
    /// Returns `None` if the permission middleware was not applied.
    fn claims(&self) -> Option<&Claims>;
}

impl<B> ClaimsExt for axum::extract::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::{Jwk, StaticKeySet, TokenVerifier};
    use atelier_test_utils::{
        bearer_with_permissions, TestRsaKey, TestTokenBuilder, TEST_AUDIENCE, TEST_ISSUER,
    };
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Json, Router,
    };
    use http_body_util::BodyExt;
    use jsonwebtoken::Algorithm;
    use tower::ServiceExt;

    fn gate() -> Arc<AuthGate> {
        let jwk: Jwk = serde_json::from_value(TestRsaKey::default().jwk_json()).unwrap();
        Arc::new(AuthGate::new(
            Arc::new(StaticKeySet::new([jwk])),
            TokenVerifier::new(
                TEST_AUDIENCE.to_string(),
                TEST_ISSUER.to_string(),
                vec![Algorithm::RS256],
            ),
        ))
    }

    async fn echo_claims(Extension(claims): Extension<Claims>) -> Json<Claims> {
        Json(claims)
    }

    async fn claims_via_ext(req: Request) -> String {
        req.claims()
            .and_then(|c| c.sub.clone())
            .unwrap_or_else(|| "none".to_string())
    }

    fn app(permission: &'static str) -> Router {
        let guard = PermissionGuard::new(gate(), permission);
        Router::new()
            .route("/echo", get(echo_claims))
            .route("/sub", get(claims_via_ext))
            .route_layer(middleware::from_fn_with_state(guard, require_permission))
    }

    fn request(uri: &str, authorization: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().method("GET").uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_authorized_request_receives_claims() {
        let claims = TestTokenBuilder::new()
            .with_permissions(&["delete:artist"])
            .build();
        let token = TestRsaKey::default().sign(&claims).unwrap();

        let response = app("delete:artist")
            .oneshot(request("/echo", Some(&format!("Bearer {token}"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, claims);
    }

    #[tokio::test]
    async fn test_claims_ext_reads_extensions() {
        let response = app("post:video")
            .oneshot(request(
                "/sub",
                Some(&bearer_with_permissions(&["post:video"])),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "auth0|test-user");
    }

    #[tokio::test]
    async fn test_missing_header_is_401_with_challenge() {
        let response = app("delete:artist")
            .oneshot(request("/echo", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("www-authenticate"));

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 401);
        assert_eq!(body["code"], "authorization_header_missing");
    }

    #[tokio::test]
    async fn test_missing_permission_is_403() {
        let response = app("post:video")
            .oneshot(request(
                "/echo",
                Some(&bearer_with_permissions(&["delete:artist"])),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["code"], "forbidden");
        assert_eq!(body["message"], "Permission not found");
    }

    #[tokio::test]
    async fn test_absent_permissions_is_400() {
        let claims = TestTokenBuilder::new().without_permissions().build();
        let token = TestRsaKey::default().sign(&claims).unwrap();

        let response = app("post:video")
            .oneshot(request("/echo", Some(&format!("Bearer {token}"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "permissions_missing");
    }

    #[tokio::test]
    async fn test_non_ascii_header_treated_as_missing() {
        let request = HttpRequest::builder()
            .uri("/echo")
            .header(
                "authorization",
                axum::http::HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
            )
            .body(Body::empty())
            .unwrap();

        let response = app("delete:artist").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["code"],
            "authorization_header_missing"
        );
    }

    #[test]
    fn test_permission_guard_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<PermissionGuard>();
    }
}
