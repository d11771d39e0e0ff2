//! Bearer-token authorization gate.
//!
//! Composes the four checks a privileged request must pass, in order:
//!
//! ```text
//! Unauthenticated --extract--> HeaderExtracted --resolve key--> KeyResolved
//!     --verify--> ClaimsVerified --permission--> Authorized
//! ```
//!
//! The first failing check short-circuits into [`Denied`], which records the
//! last stage reached and the [`AuthError`] that stopped the request.

use crate::auth::bearer::extract_bearer_token;
use crate::auth::claims::Claims;
use crate::auth::jwks::{JwksClient, KeySetProvider};
use crate::auth::jwt::TokenVerifier;
use crate::auth::AuthError;
use crate::config::Config;
use crate::observability::metrics;
use common::jwt::peek_header;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Progress of a request through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    Unauthenticated,
    HeaderExtracted,
    KeyResolved,
    ClaimsVerified,
    Authorized,
}

impl GateStage {
    pub fn as_str(self) -> &'static str {
        match self {
            GateStage::Unauthenticated => "unauthenticated",
            GateStage::HeaderExtracted => "header_extracted",
            GateStage::KeyResolved => "key_resolved",
            GateStage::ClaimsVerified => "claims_verified",
            GateStage::Authorized => "authorized",
        }
    }
}

impl fmt::Display for GateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal rejection: where the request stopped and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Denied {
    pub stage: GateStage,
    pub reason: AuthError,
}

impl Denied {
    fn at(stage: GateStage, reason: AuthError) -> Self {
        Self { stage, reason }
    }
}

/// Runs the authorization checks for privileged operations.
pub struct AuthGate {
    keys: Arc<dyn KeySetProvider>,
    verifier: TokenVerifier,
}

impl AuthGate {
    pub fn new(keys: Arc<dyn KeySetProvider>, verifier: TokenVerifier) -> Self {
        Self { keys, verifier }
    }

    /// Gate backed by a caching [`JwksClient`] built from configuration.
    pub fn from_config(config: &Config) -> Self {
        let jwks_client = JwksClient::with_settings(
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_cache_ttl_seconds),
            Duration::from_secs(config.jwks_fetch_timeout_seconds),
        );
        let verifier = TokenVerifier::new(
            config.api_audience.clone(),
            config.auth_issuer.clone(),
            config.jwt_algorithms.clone(),
        );
        Self::new(Arc::new(jwks_client), verifier)
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authorize a request for `permission`.
    ///
    /// `authorization` is the raw `Authorization` header value, if any.
    /// Returns the verified claims on success.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] carrying the stage reached and the first failure.
    #[instrument(skip_all, name = "atelier.auth.authorize", fields(permission = %permission))]
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        permission: &str,
    ) -> Result<Claims, Denied> {
        let result = self.run(authorization, permission).await;

        match &result {
            Ok(_) => {
                tracing::debug!(
                    target: "atelier.auth.gate",
                    permission = %permission,
                    stage = %GateStage::Authorized,
                    "Request authorized"
                );
                metrics::record_auth_decision(permission, "authorized");
            }
            Err(denied) => {
                tracing::info!(
                    target: "atelier.auth.gate",
                    permission = %permission,
                    stage = %denied.stage,
                    reason = denied.reason.code(),
                    "Request denied"
                );
                metrics::record_auth_decision(permission, denied.reason.code());
            }
        }

        result
    }

    async fn run(&self, authorization: Option<&str>, permission: &str) -> Result<Claims, Denied> {
        let token = extract_bearer_token(authorization)
            .map_err(|reason| Denied::at(GateStage::Unauthenticated, reason))?;

        let stage = GateStage::HeaderExtracted;
        let header = peek_header(token).map_err(|e| {
            tracing::debug!(target: "atelier.auth.gate", error = ?e, "Token header unreadable");
            Denied::at(stage, AuthError::InvalidToken)
        })?;
        let jwk = self
            .keys
            .get_key(&header.kid)
            .await
            .map_err(|reason| Denied::at(stage, reason))?;

        let stage = GateStage::KeyResolved;
        let claims = self
            .verifier
            .verify(token, &header, &jwk)
            .map_err(|reason| Denied::at(stage, reason))?;

        let stage = GateStage::ClaimsVerified;
        claims
            .require_permission(permission)
            .map_err(|reason| Denied::at(stage, reason))?;

        Ok(claims)
    }
}
