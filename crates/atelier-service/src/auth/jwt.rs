//! Signature and claims verification.
//!
//! # Security
//!
//! - The header `alg` is checked against a configured allow-list before any
//!   key material is touched; the token never chooses its own algorithm
//! - The resolved JWK must belong to the algorithm's key family and, when it
//!   declares an `alg`, must declare the same one
//! - Expiry has no leeway: `exp <= now` is expired
//! - Client-facing errors are the fixed `AuthError` descriptions; details are
//!   logged at debug level only

use crate::auth::claims::Claims;
use crate::auth::jwks::Jwk;
use crate::auth::AuthError;
use common::jwt::{key_family, KeyFamily, TokenHeader};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::collections::HashSet;
use std::str::FromStr;

/// Verifies tokens against a resolved key and the expected audience/issuer.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    audience: String,
    issuer: String,
    algorithms: Vec<Algorithm>,
}

impl TokenVerifier {
    /// # Arguments
    ///
    /// * `audience` - Required `aud` value (string or array element)
    /// * `issuer` - Required `iss` value, compared exactly
    /// * `algorithms` - Accepted header algorithms (already validated as
    ///   asymmetric by config parsing)
    pub fn new(audience: String, issuer: String, algorithms: Vec<Algorithm>) -> Self {
        Self {
            audience,
            issuer,
            algorithms,
        }
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    /// Verify `token` against `jwk` at the current time.
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::verify_at`].
    pub fn verify(&self, token: &str, header: &TokenHeader, jwk: &Jwk) -> Result<Claims, AuthError> {
        self.verify_at(token, header, jwk, chrono::Utc::now().timestamp())
    }

    /// Verify `token` against `jwk` as of `now` (Unix seconds).
    ///
    /// Checks run in order and stop at the first failure:
    /// 1. header `alg` is allow-listed and compatible with `jwk`
    /// 2. signature verifies and the payload decodes into [`Claims`]
    /// 3. `exp > now`
    /// 4. `aud` contains the expected audience
    /// 5. `iss` equals the expected issuer
    ///
    /// # Errors
    ///
    /// - `InvalidToken` for algorithm, key, signature or decoding failures
    /// - `TokenExpired` if `exp <= now`
    /// - `InvalidClaims` for audience or issuer mismatch
    pub fn verify_at(
        &self,
        token: &str,
        header: &TokenHeader,
        jwk: &Jwk,
        now: i64,
    ) -> Result<Claims, AuthError> {
        let alg = self.allowed_algorithm(&header.alg)?;
        let decoding_key = decoding_key_for(alg, &header.alg, jwk)?;

        // Only the signature and structure are checked by jsonwebtoken; the
        // registered claims are checked below so each maps to its own error.
        let mut validation = Validation::new(alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(target: "atelier.auth.jwt", error = %e, "Token signature or structure invalid");
                AuthError::InvalidToken
            })?
            .claims;

        if claims.exp <= now {
            tracing::debug!(target: "atelier.auth.jwt", exp = claims.exp, now, "Token expired");
            return Err(AuthError::TokenExpired);
        }

        if !claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.audience))
        {
            tracing::debug!(target: "atelier.auth.jwt", "Token audience mismatch");
            return Err(AuthError::InvalidClaims);
        }

        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            tracing::debug!(target: "atelier.auth.jwt", "Token issuer mismatch");
            return Err(AuthError::InvalidClaims);
        }

        Ok(claims)
    }

    fn allowed_algorithm(&self, name: &str) -> Result<Algorithm, AuthError> {
        match Algorithm::from_str(name) {
            Ok(alg) if self.algorithms.contains(&alg) => Ok(alg),
            _ => {
                tracing::debug!(target: "atelier.auth.jwt", alg = %name, "Token algorithm not allowed");
                Err(AuthError::InvalidToken)
            }
        }
    }
}

/// Build the decoding key for `alg` from `jwk`, rejecting mismatched keys.
fn decoding_key_for(alg: Algorithm, alg_name: &str, jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    let family = key_family(alg).ok_or(AuthError::InvalidToken)?;

    if jwk.kty != family.kty() {
        tracing::warn!(target: "atelier.auth.jwt", kid = %jwk.kid, kty = %jwk.kty, "JWK key type does not match token algorithm");
        return Err(AuthError::InvalidToken);
    }
    if let Some(jwk_alg) = &jwk.alg {
        if jwk_alg != alg_name {
            tracing::warn!(target: "atelier.auth.jwt", kid = %jwk.kid, jwk_alg = %jwk_alg, "JWK algorithm does not match token algorithm");
            return Err(AuthError::InvalidToken);
        }
    }

    let key = match family {
        KeyFamily::Rsa => {
            let (n, e) = jwk.n.as_deref().zip(jwk.e.as_deref()).ok_or_else(|| {
                tracing::error!(target: "atelier.auth.jwt", kid = %jwk.kid, "RSA JWK missing n or e");
                AuthError::InvalidToken
            })?;
            DecodingKey::from_rsa_components(n, e)
        }
        KeyFamily::Okp => {
            if jwk.crv.as_deref().is_some_and(|crv| crv != "Ed25519") {
                tracing::warn!(target: "atelier.auth.jwt", kid = %jwk.kid, "Unsupported OKP curve");
                return Err(AuthError::InvalidToken);
            }
            let x = jwk.x.as_deref().ok_or_else(|| {
                tracing::error!(target: "atelier.auth.jwt", kid = %jwk.kid, "OKP JWK missing x");
                AuthError::InvalidToken
            })?;
            DecodingKey::from_ed_components(x)
        }
    };

    key.map_err(|e| {
        tracing::error!(target: "atelier.auth.jwt", kid = %jwk.kid, error = %e, "Invalid JWK key material");
        AuthError::InvalidToken
    })
}
