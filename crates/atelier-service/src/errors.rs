//! Atelier error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl and share
//! one response shape:
//!
//! ```json
//! { "success": false, "error": 404, "code": "not_found", "message": "..." }
//! ```
//!
//! Authorization failures keep their own codes (see [`AuthError`]); storage
//! and other internal failures are never reported with an auth code.
//! Database details are logged server-side and replaced with a generic
//! message.

use crate::auth::{AuthError, Denied};
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Challenge sent with every 401 response.
const BEARER_CHALLENGE: &str = "Bearer realm=\"atelier-api\", error=\"invalid_token\"";

/// Service error type.
///
/// Maps to HTTP status codes:
/// - BadRequest: 400
/// - NotFound: 404
/// - MethodNotAllowed: 405
/// - RequestTimeout: 408
/// - Unprocessable: 422
/// - Database, Internal: 500
/// - Auth: the status of the wrapped [`AuthError`] (400/401/403)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request timed out")]
    RequestTimeout,

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(err) => err.status_code(),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::RequestTimeout => "request_timeout",
            ApiError::Unprocessable(_) => "unprocessable",
            ApiError::Database(_) => "database_error",
            ApiError::Internal => "internal_error",
            ApiError::Auth(err) => err.code(),
        }
    }
}

impl From<Denied> for ApiError {
    fn from(denied: Denied) -> Self {
        ApiError::Auth(denied.reason)
    }
}

/// Convert sqlx errors to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: u16,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "atelier.database", error = %err, "Database operation failed");
                "An internal database error occurred".to_string()
            }
            ApiError::Internal => "An internal error occurred".to_string(),
            ApiError::MethodNotAllowed => "Method not allowed".to_string(),
            ApiError::RequestTimeout => "Request timed out".to_string(),
            ApiError::BadRequest(reason)
            | ApiError::NotFound(reason)
            | ApiError::Unprocessable(reason) => reason.clone(),
            ApiError::Auth(err) => err.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: status.as_u16(),
            code: self.code(),
            message,
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BEARER_CHALLENGE));
        }

        response
    }
}
