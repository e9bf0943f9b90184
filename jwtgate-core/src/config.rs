//! Middleware configuration
//!
//! A [`JwtConfig`] is assembled with [`JwtConfig::builder`] and validated once
//! in [`JwtConfigBuilder::build`]. After that it is immutable and meant to be
//! shared behind an `Arc` by every handler.

use crate::callbacks::{Authenticator, Authorizator, PermitAll};
use crate::codec::TokenCodec;
use crate::signer::{signer_for, Algorithm, Signer};
use crate::ConfigError;
use http::{HeaderValue, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Token lifetime used when none (or zero) is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Body returned by every unauthorized response
pub const NOT_AUTHORIZED: &str = "Not Authorized";

/// How rejected requests are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedStyle {
    /// `401` with a `WWW-Authenticate` challenge naming the realm
    Prompt,
    /// JSON error body under `status`, no challenge
    Silent { status: StatusCode },
}

impl Default for UnauthorizedStyle {
    fn default() -> Self {
        UnauthorizedStyle::Silent {
            status: StatusCode::OK,
        }
    }
}

/// Validated, immutable middleware configuration
#[derive(Clone)]
pub struct JwtConfig {
    realm: String,
    codec: TokenCodec,
    max_refresh: Duration,
    authenticator: Arc<dyn Authenticator>,
    authorizator: Arc<dyn Authorizator>,
    unauthorized: UnauthorizedStyle,
}

impl JwtConfig {
    pub fn builder() -> JwtConfigBuilder {
        JwtConfigBuilder::default()
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn timeout(&self) -> Duration {
        self.codec.timeout()
    }

    /// Zero means tokens cannot be refreshed
    pub fn max_refresh(&self) -> Duration {
        self.max_refresh
    }

    pub fn refresh_enabled(&self) -> bool {
        !self.max_refresh.is_zero()
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn authorizator(&self) -> &dyn Authorizator {
        self.authorizator.as_ref()
    }

    pub fn unauthorized_style(&self) -> UnauthorizedStyle {
        self.unauthorized
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("realm", &self.realm)
            .field("codec", &self.codec)
            .field("max_refresh", &self.max_refresh)
            .field("unauthorized", &self.unauthorized)
            .finish_non_exhaustive()
    }
}

/// Collects configuration values; nothing is checked until [`build`](Self::build).
#[derive(Default)]
pub struct JwtConfigBuilder {
    realm: Option<String>,
    algorithm: Option<String>,
    key: Option<Vec<u8>>,
    signer: Option<Arc<dyn Signer>>,
    timeout: Option<Duration>,
    max_refresh: Duration,
    authenticator: Option<Arc<dyn Authenticator>>,
    authorizator: Option<Arc<dyn Authorizator>>,
    unauthorized: UnauthorizedStyle,
}

impl JwtConfigBuilder {
    /// Realm shown in challenge responses. Required.
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// `HS256` (default), `HS384`, `HS512` or `EdDSA`
    pub fn signing_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Secret for HMAC, 32-byte seed for EdDSA. Required unless
    /// [`signer`](Self::signer) is used.
    pub fn key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Use a custom signer instead of algorithm + key
    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// How long after the original login a token may still be refreshed.
    /// The longest a session can last is therefore `max_refresh + timeout`.
    pub fn max_refresh(mut self, max_refresh: Duration) -> Self {
        self.max_refresh = max_refresh;
        self
    }

    /// Required
    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    pub fn authorizator(mut self, authorizator: impl Authorizator + 'static) -> Self {
        self.authorizator = Some(Arc::new(authorizator));
        self
    }

    pub fn unauthorized(mut self, style: UnauthorizedStyle) -> Self {
        self.unauthorized = style;
        self
    }

    /// Shorthand for [`UnauthorizedStyle::Prompt`]
    pub fn prompt(self) -> Self {
        self.unauthorized(UnauthorizedStyle::Prompt)
    }

    pub fn build(self) -> Result<JwtConfig, ConfigError> {
        let realm = match self.realm {
            Some(realm) if !realm.is_empty() => realm,
            _ => return Err(ConfigError::MissingRealm),
        };
        if realm.contains('"') || HeaderValue::from_str(&realm).is_err() {
            return Err(ConfigError::InvalidRealm(realm));
        }

        let signer = match self.signer {
            Some(signer) => signer,
            None => {
                let algorithm: Algorithm = match self.algorithm.as_deref() {
                    None | Some("") => Algorithm::default(),
                    Some(name) => name.parse()?,
                };
                let key = self.key.ok_or(ConfigError::MissingKey)?;
                signer_for(algorithm, &key)?
            }
        };

        // tokens carry whole seconds
        let timeout = match self.timeout {
            Some(timeout) if !timeout.is_zero() => whole_seconds("timeout", timeout)?,
            _ => DEFAULT_TIMEOUT,
        };
        let max_refresh = whole_seconds("max_refresh", self.max_refresh)?;

        let authenticator = self.authenticator.ok_or(ConfigError::MissingAuthenticator)?;
        let authorizator: Arc<dyn Authorizator> = match self.authorizator {
            Some(authorizator) => authorizator,
            None => Arc::new(PermitAll),
        };

        Ok(JwtConfig {
            realm,
            codec: TokenCodec::new(signer, timeout, !max_refresh.is_zero()),
            max_refresh,
            authenticator,
            authorizator,
            unauthorized: self.unauthorized,
        })
    }
}

fn whole_seconds(setting: &'static str, value: Duration) -> Result<Duration, ConfigError> {
    if !value.is_zero() && value < Duration::from_secs(1) {
        return Err(ConfigError::SubSecondDuration { setting, value });
    }
    Ok(value)
}
