//! Signing key resolution.
//!
//! The token issuer publishes its public keys as a JSON Web Key Set at
//! `https://<domain>/.well-known/jwks.json`. Keys are resolved through the
//! [`KeySetProvider`] trait so the gate never depends on a process-wide
//! singleton:
//!
//! - [`JwksClient`] fetches the set over HTTP (bounded by a timeout) and
//!   caches it with a configurable TTL
//! - [`StaticKeySet`] serves a fixed set, for tests and offline use
//!
//! # Concurrency
//!
//! Concurrent requests that miss the cache may each fetch the set. The
//! fetched content is immutable, so the last write simply wins. A failed
//! fetch is reported immediately and never retried inside the gate.

use crate::auth::AuthError;
use crate::observability::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Default timeout for a single JWKS fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// JSON Web Key from a JWKS document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" or "OKP").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm the key is intended for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// OKP curve name ("Ed25519").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// OKP public key (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// Resolves a key ID to the issuer's public key.
#[async_trait]
pub trait KeySetProvider: Send + Sync {
    /// Look up the key with the given `kid`.
    ///
    /// # Errors
    ///
    /// - `KeyNotFound` if no key in the set has this `kid`
    /// - `KeySetUnavailable` if the set cannot be obtained
    async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError>;
}

/// Fixed key set. Never fetches anything.
#[derive(Debug, Clone, Default)]
pub struct StaticKeySet {
    keys: HashMap<String, Jwk>,
}

impl StaticKeySet {
    pub fn new(keys: impl IntoIterator<Item = Jwk>) -> Self {
        Self {
            keys: keys.into_iter().map(|key| (key.kid.clone(), key)).collect(),
        }
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl KeySetProvider for StaticKeySet {
    async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        self.keys.get(kid).cloned().ok_or_else(|| {
            tracing::debug!(target: "atelier.auth.jwks", kid = %kid, "Key not found in static key set");
            AuthError::KeyNotFound
        })
    }
}

/// Cached JWKS data with expiry time.
struct CachedJwks {
    /// Map of key ID to JWK.
    keys: HashMap<String, Jwk>,

    /// When this cache entry expires.
    expires_at: Instant,
}

/// JWKS client for fetching and caching the issuer's public keys.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS (carries the fetch timeout).
    http_client: reqwest::Client,

    /// Cached JWKS data.
    cache: Arc<RwLock<Option<CachedJwks>>>,

    /// Cache TTL duration.
    cache_ttl: Duration,
}

impl JwksClient {
    /// Create a JWKS client with the default TTL and fetch timeout.
    pub fn new(jwks_url: String) -> Self {
        Self::with_settings(
            jwks_url,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
        )
    }

    /// Create a JWKS client with custom cache TTL and fetch timeout.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - Full URL of the JWKS document
    /// * `cache_ttl` - How long a fetched set is served before refreshing
    /// * `fetch_timeout` - Upper bound on a single fetch
    pub fn with_settings(jwks_url: String, cache_ttl: Duration, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "atelier.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl,
        }
    }

    /// JWKS URL for an issuer domain such as `example.auth0.com`.
    pub fn url_for_domain(domain: &str) -> String {
        format!("https://{domain}/.well-known/jwks.json")
    }

    /// The URL this client fetches from.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Refresh the JWKS cache by fetching from the issuer.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<(), AuthError> {
        tracing::debug!(target: "atelier.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "atelier.auth.jwks", error = %e, timeout = e.is_timeout(), "Failed to fetch JWKS");
                metrics::record_jwks_fetch("error");
                AuthError::KeySetUnavailable
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "atelier.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            metrics::record_jwks_fetch("error");
            return Err(AuthError::KeySetUnavailable);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "atelier.auth.jwks", error = %e, "Failed to parse JWKS response");
            metrics::record_jwks_fetch("error");
            AuthError::KeySetUnavailable
        })?;

        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(
            target: "atelier.auth.jwks",
            key_count = keys.len(),
            "JWKS cache refreshed"
        );
        metrics::record_jwks_fetch("success");

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            expires_at: Instant::now() + self.cache_ttl,
        });

        Ok(())
    }

    /// Drop the cached set so the next lookup fetches again.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}

#[async_trait]
impl KeySetProvider for JwksClient {
    /// Returns the key from cache, fetching the set first if the cache is
    /// empty or expired. A `kid` missing from a fresh set is `KeyNotFound`
    /// without another fetch.
    #[instrument(skip(self), fields(kid = %kid))]
    async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(key) = cached.keys.get(kid) {
                        tracing::debug!(target: "atelier.auth.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    tracing::debug!(target: "atelier.auth.jwks", kid = %kid, "Key not found in JWKS cache");
                    return Err(AuthError::KeyNotFound);
                }
            }
        }

        self.refresh_cache().await?;

        let cache = self.cache.read().await;
        if let Some(key) = cache.as_ref().and_then(|cached| cached.keys.get(kid)) {
            return Ok(key.clone());
        }

        tracing::warn!(target: "atelier.auth.jwks", kid = %kid, "Key not found in JWKS after refresh");
        Err(AuthError::KeyNotFound)
    }
}
