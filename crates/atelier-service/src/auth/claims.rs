//! JWT claims structure.
//!
//! Contains the claims extracted from verified tokens. Registered claims the
//! gate checks are typed fields; every other claim is kept in `extra` so the
//! decoded mapping reaches handlers unmodified. The `sub` field is redacted
//! in Debug output to prevent exposure in logs.

use crate::auth::AuthError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// The `aud` claim: a single audience or a list of audiences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// Whether `expected` is (one of) the audience(s).
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Claims of a verified access token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or client identifier) - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration timestamp (Unix epoch seconds, fractions floored).
    #[serde(deserialize_with = "numeric_date")]
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds, fractions floored).
    #[serde(
        default,
        deserialize_with = "optional_numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,

    /// Granted permissions. `None` means the claim is absent, which is
    /// distinct from an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    /// All remaining claims, verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A NumericDate may be an integer or a fraction of seconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericDate {
    Seconds(i64),
    Fractional(f64),
}

impl NumericDate {
    fn floor<E: de::Error>(self) -> Result<i64, E> {
        match self {
            NumericDate::Seconds(secs) => Ok(secs),
            NumericDate::Fractional(secs) if secs.is_finite() => Ok(secs.floor() as i64),
            NumericDate::Fractional(_) => Err(E::custom("NumericDate must be finite")),
        }
    }
}

fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    NumericDate::deserialize(deserializer)?.floor()
}

fn optional_numeric_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<NumericDate>::deserialize(deserializer)?
        .map(NumericDate::floor)
        .transpose()
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("permissions", &self.permissions)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Claims {
    /// Check that `permission` is granted by this token.
    ///
    /// # Errors
    ///
    /// - `PermissionsClaimMissing` if the token carries no `permissions` claim
    /// - `Forbidden` if the claim is present but lacks `permission`
    pub fn require_permission(&self, permission: &str) -> Result<(), AuthError> {
        let permissions = self.permissions.as_ref().ok_or_else(|| {
            tracing::warn!(target: "atelier.auth.claims", "Token has no permissions claim");
            AuthError::PermissionsClaimMissing
        })?;

        if permissions.iter().any(|p| p == permission) {
            Ok(())
        } else {
            tracing::debug!(
                target: "atelier.auth.claims",
                required = %permission,
                "Required permission not granted"
            );
            Err(AuthError::Forbidden)
        }
    }

    /// Whether `permission` is granted (absent claim counts as not granted).
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|perms| perms.iter().any(|p| p == permission))
    }
}
