//! Mock JWKS endpoint backed by wiremock.

use crate::crypto_fixtures::{default_jwks_json, jwks_json, FixtureError};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the issuer publishes its key set under.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A running mock key-distribution endpoint.
pub struct JwksMock {
    server: MockServer,
}

impl JwksMock {
    /// Serve the default fixture key set (RSA and Ed25519 keys).
    pub async fn start() -> Result<Self, FixtureError> {
        Ok(Self::with_document(default_jwks_json()?).await)
    }

    /// Serve a key set containing `keys`.
    pub async fn with_keys(keys: &[Value]) -> Self {
        Self::with_document(jwks_json(keys)).await
    }

    /// Serve an arbitrary JSON document at the JWKS path.
    pub async fn with_document(document: Value) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Respond to every fetch with `status` and an empty body.
    pub async fn failing(status: u16) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Full URL of the JWKS document.
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// How many times the key set has been fetched so far.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
