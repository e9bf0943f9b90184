//! Token codec
//!
//! Mints claim sets into compact JWS strings
//! (`base64url(header).base64url(payload).base64url(signature)`) and turns
//! token strings back into verified claim sets. The codec also owns the
//! sliding refresh rule, since a refresh is a verify followed by a mint that
//! carries the original issuance time forward.

use crate::claims::{unix_now, ClaimSet, UnixTime};
use crate::signer::Signer;
use crate::AuthError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Mints and verifies tokens with one signer and one timeout.
#[derive(Clone)]
pub struct TokenCodec {
    signer: Arc<dyn Signer>,
    timeout: Duration,
    refreshable: bool,
}

impl TokenCodec {
    /// `refreshable` controls whether minted tokens carry `orig_iat`.
    pub fn new(signer: Arc<dyn Signer>, timeout: Duration, refreshable: bool) -> Self {
        TokenCodec {
            signer,
            timeout,
            refreshable,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_refreshable(&self) -> bool {
        self.refreshable
    }

    /// `alg` value written into every header
    pub fn algorithm(&self) -> &str {
        self.signer.algorithm()
    }

    /// Mint a token for `identity`, valid for the configured timeout from now.
    ///
    /// `prior_issued_at` is the original issuance time on the refresh path and
    /// `None` at login.
    pub fn mint(
        &self,
        identity: &str,
        prior_issued_at: Option<UnixTime>,
    ) -> Result<String, AuthError> {
        self.mint_at(identity, prior_issued_at, unix_now())
    }

    /// [`mint`](Self::mint) with an explicit clock reading
    pub fn mint_at(
        &self,
        identity: &str,
        prior_issued_at: Option<UnixTime>,
        now: UnixTime,
    ) -> Result<String, AuthError> {
        if identity.is_empty() {
            return Err(AuthError::Malformed);
        }

        let issued_at = if self.refreshable {
            Some(prior_issued_at.unwrap_or(now))
        } else {
            None
        };
        let claims = ClaimSet::new(identity, now, self.timeout, issued_at);
        let header = Header {
            alg: self.signer.algorithm().to_string(),
            typ: Some("JWT".to_string()),
        };

        let mut token = encode_segment(&header)?;
        token.push('.');
        token.push_str(&encode_segment(&claims)?);

        let signature = self.signer.sign(token.as_bytes())?;
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(signature));

        Ok(token)
    }

    /// Verify signature and expiry of `token` and return its claims.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        self.verify_at(token, unix_now())
    }

    /// [`verify`](Self::verify) with an explicit clock reading
    pub fn verify_at(&self, token: &str, now: UnixTime) -> Result<ClaimSet, AuthError> {
        let mut segments = token.split('.');
        let (header_b64, payload_b64, signature_b64) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(h), Some(p), Some(s), None)
                if !h.is_empty() && !p.is_empty() && !s.is_empty() =>
            {
                (h, p, s)
            }
            _ => return Err(AuthError::Malformed),
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != self.signer.algorithm() {
            return Err(AuthError::InvalidSignature);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::Malformed)?;
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        self.signer.verify(signing_input.as_bytes(), &signature)?;

        let claims: ClaimSet = decode_segment(payload_b64)?;
        if claims.identity.is_empty() {
            return Err(AuthError::Malformed);
        }
        if claims.is_expired_at(now) {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Re-issue a token for already verified `claims`.
    pub fn refresh(&self, claims: &ClaimSet, max_refresh: Duration) -> Result<String, AuthError> {
        self.refresh_at(claims, max_refresh, unix_now())
    }

    /// [`refresh`](Self::refresh) with an explicit clock reading.
    ///
    /// Refresh is allowed while `issued_at >= now - max_refresh`; the
    /// boundary instant itself is still inside the window.
    pub fn refresh_at(
        &self,
        claims: &ClaimSet,
        max_refresh: Duration,
        now: UnixTime,
    ) -> Result<String, AuthError> {
        let issued_at = claims.issued_at.ok_or(AuthError::Malformed)?;

        if issued_at < now.saturating_sub(max_refresh.as_secs()) {
            return Err(AuthError::RefreshWindowExpired);
        }

        self.mint_at(&claims.identity, Some(issued_at), now)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.signer.algorithm())
            .field("timeout", &self.timeout)
            .field("refreshable", &self.refreshable)
            .finish()
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(|e| AuthError::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)
}
