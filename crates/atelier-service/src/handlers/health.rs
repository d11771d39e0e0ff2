//! Public operational handlers.
//!
//! - `/`: greeting text
//! - `/health`: liveness, no dependency checks
//! - `/ready`: readiness, checks the database
//! - fallback: 404 in the standard error shape

use crate::errors::ApiError;
use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Greeting served at `/`.
pub const GREETING: &str = "Salutations Comrade. No front end created yet. see README.md";

pub async fn greeting() -> &'static str {
    GREETING
}

/// Liveness check handler.
///
/// Returns "OK" while the process is running. Never checks dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check handler.
///
/// Returns 200 when the database answers a trivial query, 503 otherwise.
/// The key set endpoint is not checked; keys are fetched on demand.
#[tracing::instrument(skip_all, name = "atelier.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                database: "healthy",
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "atelier.health", error = %e, "Readiness check failed: database error");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    database: "unhealthy",
                }),
            )
        }
    }
}

/// Router fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        assert_eq!(health_check().await, "OK");
    }

    #[tokio::test]
    async fn test_greeting() {
        assert_eq!(greeting().await, GREETING);
    }

    #[tokio::test]
    async fn test_not_found_is_404() {
        assert_eq!(not_found().await.status_code(), StatusCode::NOT_FOUND);
    }
}
