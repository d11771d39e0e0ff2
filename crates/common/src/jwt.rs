//! JWT utilities shared across Atelier crates.
//!
//! This module provides the pieces of bearer-token handling that do not
//! depend on a key set or on service configuration:
//! - Size limit for DoS prevention
//! - Unverified header inspection (`kid` and `alg`) for key lookup
//! - The asymmetric algorithm allow-list and its parsing
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Header values are only used to *select* a key; the token must still be
//!   verified against that key
//! - HMAC algorithms are never accepted: a JWKS publishes public keys, and
//!   accepting `HS*` would let a public key double as a shared secret
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{peek_header, parse_algorithm_list};
//!
//! let allowed = parse_algorithm_list("RS256")?;
//! let header = peek_header(token)?;
//! let jwk = key_set.get_key(&header.kid).await?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::Algorithm;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this are rejected BEFORE any base64 decoding or
/// cryptographic work. Typical access tokens from an OAuth provider are
/// well under 2KB even with a long permission list.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Asymmetric signature algorithms the service knows how to verify.
pub const SUPPORTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::EdDSA,
];

/// Algorithm allow-list used when none is configured.
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::RS256;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while inspecting an unverified JWT header.
///
/// Messages are generic to prevent information leakage; details are logged
/// at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtHeaderError {
    /// Token size exceeds maximum allowed.
    #[error("Unable to parse authentication token")]
    TokenTooLarge,

    /// Token is not a three-segment JWS, or the header is not base64url JSON.
    #[error("Unable to parse authentication token")]
    MalformedToken,

    /// Header has no usable `kid`.
    #[error("Unable to parse authentication token")]
    MissingKid,

    /// Header has no `alg` string.
    #[error("Unable to parse authentication token")]
    MissingAlg,
}

/// Errors raised while parsing a configured algorithm allow-list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmListError {
    #[error("unknown JWT algorithm '{0}'")]
    Unknown(String),

    #[error("JWT algorithm '{0}' is not an allowed asymmetric algorithm")]
    NotAllowed(String),

    #[error("JWT algorithm allow-list is empty")]
    Empty,
}

// =============================================================================
// Types
// =============================================================================

/// Key family an algorithm's verification key must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    /// `kty: "RSA"` keys (RS*/PS*).
    Rsa,
    /// `kty: "OKP"` keys (EdDSA / Ed25519).
    Okp,
}

impl KeyFamily {
    /// The JWK `kty` value for this family.
    #[must_use]
    pub fn kty(self) -> &'static str {
        match self {
            KeyFamily::Rsa => "RSA",
            KeyFamily::Okp => "OKP",
        }
    }
}

/// Unverified fields read from a JWT header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Key ID used to select the verification key.
    pub kid: String,
    /// Declared algorithm, as written in the token. Must be checked against
    /// an allow-list before use.
    pub alg: String,
}

// =============================================================================
// Functions
// =============================================================================

/// Read `kid` and `alg` from a JWT header without verifying the signature.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing
/// - This function does NOT validate the token signature
/// - The `kid` value should only be used for key lookup in a trusted JWKS
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - wrong segment count, bad base64url, or invalid JSON
/// - `MissingKid` - `kid` absent, empty, or not a string
/// - `MissingAlg` - `alg` absent or not a string
pub fn peek_header(token: &str) -> Result<TokenHeader, JwtHeaderError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtHeaderError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtHeaderError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtHeaderError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtHeaderError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtHeaderError::MalformedToken
    })?;

    let kid = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtHeaderError::MissingKid)?;

    let alg = header
        .get("alg")
        .and_then(|v| v.as_str())
        .map(ToString::to_string)
        .ok_or(JwtHeaderError::MissingAlg)?;

    Ok(TokenHeader { kid, alg })
}

/// Key family required to verify a signature made with `alg`.
///
/// Returns `None` for algorithms outside [`SUPPORTED_ALGORITHMS`].
#[must_use]
pub fn key_family(alg: Algorithm) -> Option<KeyFamily> {
    match alg {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => Some(KeyFamily::Rsa),
        Algorithm::EdDSA => Some(KeyFamily::Okp),
        _ => None,
    }
}

/// Parse one algorithm name, accepting only [`SUPPORTED_ALGORITHMS`].
///
/// # Errors
///
/// Returns `Unknown` for names jsonwebtoken does not recognise and
/// `NotAllowed` for recognised but unsupported ones (HS*, ES*).
pub fn parse_algorithm(name: &str) -> Result<Algorithm, AlgorithmListError> {
    let alg =
        Algorithm::from_str(name).map_err(|_| AlgorithmListError::Unknown(name.to_string()))?;
    if SUPPORTED_ALGORITHMS.contains(&alg) {
        Ok(alg)
    } else {
        Err(AlgorithmListError::NotAllowed(name.to_string()))
    }
}

/// Parse a comma-separated allow-list such as `"RS256, EdDSA"`.
///
/// Whitespace around entries is ignored and duplicates are collapsed.
///
/// # Errors
///
/// Returns the first entry that fails [`parse_algorithm`], or `Empty` if the
/// list has no entries.
pub fn parse_algorithm_list(list: &str) -> Result<Vec<Algorithm>, AlgorithmListError> {
    let mut algorithms = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = parse_algorithm(name)?;
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    if algorithms.is_empty() {
        return Err(AlgorithmListError::Empty);
    }

    Ok(algorithms)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn token_with_header(header: &str) -> String {
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        format!("{header_b64}.payload.signature")
    }

    // -------------------------------------------------------------------------
    // peek_header Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_peek_header_valid_token() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":"test-key-01"}"#);

        let header = peek_header(&token).unwrap();
        assert_eq!(header.kid, "test-key-01");
        assert_eq!(header.alg, "RS256");
    }

    #[test]
    fn test_peek_header_missing_kid() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT"}"#);
        assert_eq!(peek_header(&token), Err(JwtHeaderError::MissingKid));
    }

    #[test]
    fn test_peek_header_empty_kid_rejected() {
        let token = token_with_header(r#"{"alg":"RS256","kid":""}"#);
        assert_eq!(peek_header(&token), Err(JwtHeaderError::MissingKid));
    }

    #[test]
    fn test_peek_header_non_string_kid() {
        let token = token_with_header(r#"{"alg":"RS256","kid":12345}"#);
        assert_eq!(peek_header(&token), Err(JwtHeaderError::MissingKid));
    }

    #[test]
    fn test_peek_header_missing_alg() {
        let token = token_with_header(r#"{"kid":"key"}"#);
        assert_eq!(peek_header(&token), Err(JwtHeaderError::MissingAlg));
    }

    #[test]
    fn test_peek_header_malformed_token() {
        assert_eq!(peek_header("not-a-jwt"), Err(JwtHeaderError::MalformedToken));
        assert_eq!(peek_header("only.two"), Err(JwtHeaderError::MalformedToken));
        assert_eq!(peek_header("a.b.c.d"), Err(JwtHeaderError::MalformedToken));
        assert_eq!(peek_header(""), Err(JwtHeaderError::MalformedToken));
    }

    #[test]
    fn test_peek_header_invalid_base64() {
        assert_eq!(
            peek_header("!!!invalid!!!.payload.signature"),
            Err(JwtHeaderError::MalformedToken)
        );
    }

    #[test]
    fn test_peek_header_invalid_json() {
        let token = token_with_header("not-json");
        assert_eq!(peek_header(&token), Err(JwtHeaderError::MalformedToken));
    }

    #[test]
    fn test_peek_header_oversized_token() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(peek_header(&oversized), Err(JwtHeaderError::TokenTooLarge));
    }

    #[test]
    fn test_peek_header_at_size_limit() {
        let header_b64 = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"key"}"#);
        let remaining = MAX_JWT_SIZE_BYTES - header_b64.len() - 2; // two dots
        let payload_len = remaining / 2;
        let token = format!(
            "{}.{}.{}",
            header_b64,
            "a".repeat(payload_len),
            "b".repeat(remaining - payload_len)
        );
        assert_eq!(token.len(), MAX_JWT_SIZE_BYTES);

        assert_eq!(peek_header(&token).unwrap().kid, "key");
    }

    // -------------------------------------------------------------------------
    // Algorithm allow-list Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_algorithm_accepts_supported() {
        assert_eq!(parse_algorithm("RS256").unwrap(), Algorithm::RS256);
        assert_eq!(parse_algorithm("PS512").unwrap(), Algorithm::PS512);
        assert_eq!(parse_algorithm("EdDSA").unwrap(), Algorithm::EdDSA);
    }

    #[test]
    fn test_parse_algorithm_rejects_hmac() {
        assert_eq!(
            parse_algorithm("HS256"),
            Err(AlgorithmListError::NotAllowed("HS256".to_string()))
        );
    }

    #[test]
    fn test_parse_algorithm_rejects_unknown() {
        assert_eq!(
            parse_algorithm("none"),
            Err(AlgorithmListError::Unknown("none".to_string()))
        );
    }

    #[test]
    fn test_parse_algorithm_list_trims_and_dedups() {
        let algs = parse_algorithm_list(" RS256, EdDSA ,RS256,").unwrap();
        assert_eq!(algs, vec![Algorithm::RS256, Algorithm::EdDSA]);
    }

    #[test]
    fn test_parse_algorithm_list_empty() {
        assert_eq!(parse_algorithm_list(" , "), Err(AlgorithmListError::Empty));
    }

    #[test]
    fn test_key_family() {
        assert_eq!(key_family(Algorithm::RS256), Some(KeyFamily::Rsa));
        assert_eq!(key_family(Algorithm::PS384), Some(KeyFamily::Rsa));
        assert_eq!(key_family(Algorithm::EdDSA), Some(KeyFamily::Okp));
        assert_eq!(key_family(Algorithm::HS256), None);
        assert_eq!(key_family(Algorithm::ES256), None);
        assert_eq!(KeyFamily::Rsa.kty(), "RSA");
        assert_eq!(KeyFamily::Okp.kty(), "OKP");
    }

    #[test]
    fn test_default_algorithm_is_supported() {
        assert!(SUPPORTED_ALGORITHMS.contains(&DEFAULT_ALGORITHM));
    }
}
