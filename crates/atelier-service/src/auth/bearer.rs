//! Bearer token extraction from the `Authorization` header.

use crate::auth::AuthError;

/// The only accepted authorization scheme (case-sensitive).
pub const BEARER_SCHEME: &str = "Bearer";

/// Extract the raw token from an `Authorization` header value.
///
/// The header must be exactly `Bearer <token>`: two parts separated by a
/// single space. The token is returned verbatim.
///
/// # Errors
///
/// - `MissingHeader` if `header` is `None`
/// - `MalformedHeader` if the value does not split into exactly two parts
/// - `UnsupportedScheme` if the first part is not `Bearer`
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or_else(|| {
        tracing::debug!(target: "atelier.auth.bearer", "Missing Authorization header");
        AuthError::MissingHeader
    })?;

    let mut parts = header.split(' ');
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => {
            tracing::debug!(target: "atelier.auth.bearer", "Authorization header is not two parts");
            return Err(AuthError::MalformedHeader);
        }
    };

    if scheme != BEARER_SCHEME {
        tracing::debug!(target: "atelier.auth.bearer", "Unsupported authorization scheme");
        return Err(AuthError::UnsupportedScheme);
    }

    Ok(token)
}
