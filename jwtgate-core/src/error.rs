//! Error types for jwtgate

use thiserror::Error;

/// Request-time authentication failures.
///
/// Every variant collapses to the same unauthorized response at the HTTP
/// boundary; the distinction only exists for logging and tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    MissingOrMalformedHeader,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("credentials rejected")]
    CredentialRejected,

    #[error("authorization denied")]
    AuthorizationDenied,

    #[error("refresh window expired")]
    RefreshWindowExpired,

    #[error("signing failed: {0}")]
    Signing(String),
}

/// Startup-time configuration failures. Fatal: a server must not start
/// serving with an invalid configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("realm is required")]
    MissingRealm,

    #[error("realm cannot be used in a challenge header: {0:?}")]
    InvalidRealm(String),

    #[error("signing key is required")]
    MissingKey,

    #[error("authenticator is required")]
    MissingAuthenticator,

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("refresh is disabled (max_refresh is zero)")]
    RefreshDisabled,

    #[error("{setting} must be zero or at least one second, got {value:?}")]
    SubSecondDuration {
        setting: &'static str,
        value: std::time::Duration,
    },
}
