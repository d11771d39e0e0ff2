//! Authorization failure taxonomy.
//!
//! Every way the bearer-token gate can reject a request has its own variant.
//! Each variant maps to a fixed HTTP status and machine-readable code; the
//! `Display` text is the human-readable description sent to clients.

use axum::http::StatusCode;
use thiserror::Error;

/// Why the gate denied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected")]
    MissingHeader,

    #[error("Authorization header must be a bearer token")]
    MalformedHeader,

    #[error("Authorization header must start with \"Bearer\"")]
    UnsupportedScheme,

    #[error("Unable to parse authentication token")]
    InvalidToken,

    #[error("Unable to find the appropriate key")]
    KeyNotFound,

    #[error("Unable to fetch signing keys")]
    KeySetUnavailable,

    #[error("Token expired")]
    TokenExpired,

    #[error("Incorrect claims, please check the audience and issuer")]
    InvalidClaims,

    #[error("Permissions not included in token")]
    PermissionsClaimMissing,

    #[error("Permission not found")]
    Forbidden,
}

impl AuthError {
    /// HTTP status for this failure.
    ///
    /// Authentication failures are 401, a valid token lacking the required
    /// permission is 403, and a token with no permissions claim at all is
    /// 400 (misconfigured issuer policy rather than a denial).
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::PermissionsClaimMissing => StatusCode::BAD_REQUEST,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::MissingHeader
            | AuthError::MalformedHeader
            | AuthError::UnsupportedScheme
            | AuthError::InvalidToken
            | AuthError::KeyNotFound
            | AuthError::KeySetUnavailable
            | AuthError::TokenExpired
            | AuthError::InvalidClaims => StatusCode::UNAUTHORIZED,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "authorization_header_missing",
            AuthError::MalformedHeader => "invalid_header",
            AuthError::UnsupportedScheme => "invalid_scheme",
            AuthError::InvalidToken => "invalid_token",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::KeySetUnavailable => "key_set_unavailable",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::PermissionsClaimMissing => "permissions_missing",
            AuthError::Forbidden => "forbidden",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const ALL: [AuthError; 10] = [
        AuthError::MissingHeader,
        AuthError::MalformedHeader,
        AuthError::UnsupportedScheme,
        AuthError::InvalidToken,
        AuthError::KeyNotFound,
        AuthError::KeySetUnavailable,
        AuthError::TokenExpired,
        AuthError::InvalidClaims,
        AuthError::PermissionsClaimMissing,
        AuthError::Forbidden,
    ];

    #[test]
    fn test_status_codes() {
        for err in ALL {
            let expected = match err {
                AuthError::PermissionsClaimMissing => 400,
                AuthError::Forbidden => 403,
                _ => 401,
            };
            assert_eq!(err.status_code().as_u16(), expected, "{err:?}");
        }
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<&str> = ALL.iter().map(AuthError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ALL.len());
    }

    #[test]
    fn test_display_descriptions() {
        assert_eq!(AuthError::TokenExpired.to_string(), "Token expired");
        assert_eq!(
            AuthError::UnsupportedScheme.to_string(),
            "Authorization header must start with \"Bearer\""
        );
    }
}
