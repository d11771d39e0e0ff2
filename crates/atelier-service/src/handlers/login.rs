//! Hosted login URL.
//!
//! `GET /authorization/url` returns the identity provider's authorize URL for
//! the implicit flow, so a front end can send users to log in and receive an
//! access token for this API's audience.

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::LoginUrlResponse;
use crate::routes::AppState;
use axum::{extract::State, Json};
use reqwest::Url;
use std::sync::Arc;

/// Handler for GET /authorization/url
///
/// 404 when the client id or callback URL is not configured.
#[tracing::instrument(skip_all, name = "atelier.handlers.login_url")]
pub async fn login_url(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LoginUrlResponse>, ApiError> {
    let url = build_login_url(&state.config)?;
    Ok(Json(LoginUrlResponse { url }))
}

fn build_login_url(config: &Config) -> Result<String, ApiError> {
    let (Some(client_id), Some(callback_url)) =
        (&config.auth_client_id, &config.auth_callback_url)
    else {
        return Err(ApiError::NotFound(
            "Login URL is not configured".to_string(),
        ));
    };

    let url = Url::parse_with_params(
        &format!("https://{}/authorize", config.auth_domain),
        &[
            ("audience", config.api_audience.as_str()),
            ("response_type", "token"),
            ("client_id", client_id.as_str()),
            ("redirect_uri", callback_url.as_str()),
        ],
    )
    .map_err(|e| {
        tracing::error!(target: "atelier.handlers.login", error = %e, "Failed to build login URL");
        ApiError::Internal
    })?;

    Ok(url.into())
}
