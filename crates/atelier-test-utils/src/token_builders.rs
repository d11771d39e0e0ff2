//! Builder patterns for test data construction
//!
//! Provides fluent APIs for creating test token claims and signed bearer
//! headers.

use crate::crypto_fixtures::{TestRsaKey, TEST_AUDIENCE, TEST_ISSUER};
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Builder for creating test JWT claims
///
/// Defaults match the harness configuration: audience `api-id`, issuer
/// `https://example.auth0.com/`, one hour of validity, and an empty
/// `permissions` list.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .with_permissions(&["delete:artist"])
///     .expires_in(3600)
///     .build();
/// let token = TestRsaKey::default().sign(&claims)?;
/// ```
pub struct TestTokenBuilder {
    sub: String,
    iss: Option<String>,
    aud: Option<Value>,
    exp: Option<i64>,
    iat: i64,
    permissions: Option<Vec<String>>,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "auth0|test-user".to_string(),
            iss: Some(TEST_ISSUER.to_string()),
            aud: Some(json!(TEST_AUDIENCE)),
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: now.timestamp(),
            permissions: Some(Vec::new()),
            extra: Map::new(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the issuer
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Omit the `iss` claim
    pub fn without_issuer(mut self) -> Self {
        self.iss = None;
        self
    }

    /// Set a single audience string
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = Some(json!(audience));
        self
    }

    /// Set an audience array
    pub fn with_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = Some(json!(audiences));
        self
    }

    /// Omit the `aud` claim
    pub fn without_audience(mut self) -> Self {
        self.aud = None;
        self
    }

    /// Set the permissions claim
    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = Some(permissions.iter().map(ToString::to_string).collect());
        self
    }

    /// Omit the permissions claim entirely
    pub fn without_permissions(mut self) -> Self {
        self.permissions = None;
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Set an absolute expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = Some(timestamp);
        self
    }

    /// Omit the `exp` claim
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Add an arbitrary claim. Applied last, so it replaces any registered
    /// claim of the same name.
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(iss) = self.iss {
            claims.insert("iss".to_string(), json!(iss));
        }
        if let Some(aud) = self.aud {
            claims.insert("aud".to_string(), aud);
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        if let Some(permissions) = self.permissions {
            claims.insert("permissions".to_string(), json!(permissions));
        }
        claims.extend(self.extra);
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `Authorization` header value for a valid RS256 token granting `permissions`.
pub fn bearer_with_permissions(permissions: &[&str]) -> String {
    let claims = TestTokenBuilder::new().with_permissions(permissions).build();
    let token = TestRsaKey::default()
        .sign(&claims)
        .expect("fixture RSA key should sign");
    format!("Bearer {token}")
}
