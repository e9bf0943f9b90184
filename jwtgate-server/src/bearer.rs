//! Bearer token extraction from the `Authorization` header

use hyper::header::AUTHORIZATION;
use hyper::HeaderMap;
use jwtgate_core::AuthError;

/// Return the token from `Authorization: Bearer <token>`.
///
/// The header must hold exactly two space-separated parts, the first being
/// literally `Bearer`. Anything else never reaches signature verification.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingOrMalformedHeader)?
        .to_str()
        .map_err(|_| AuthError::MissingOrMalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingOrMalformedHeader),
    }
}
