//! Signing capability and the built-in signers
//!
//! The codec never touches key material directly: it hands the bytes to sign
//! (`header.payload`) to a [`Signer`] and asks the same signer to check the
//! embedded signature. HMAC signers verify by re-signing and comparing in
//! constant time; asymmetric signers verify against their public key.

use crate::timing::mac_matches;
use crate::{AuthError, ConfigError};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Built-in signing algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    #[default]
    HS256,
    HS384,
    HS512,
    EdDSA,
}

impl Algorithm {
    /// JOSE `alg` identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::EdDSA => "EdDSA",
        }
    }

    pub fn is_hmac(&self) -> bool {
        matches!(self, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            "EdDSA" => Ok(Algorithm::EdDSA),
            other => Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Capability to sign a byte payload and to verify a signature over one.
///
/// Implement this to plug in algorithms jwtgate does not ship (RSA, ECDSA).
pub trait Signer: Send + Sync {
    /// Value written to (and expected in) the token header's `alg` field
    fn algorithm(&self) -> &str;

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, AuthError>;

    /// `Err(AuthError::InvalidSignature)` on mismatch
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), AuthError>;
}

/// Build the built-in signer for `algorithm` from raw key bytes
pub fn signer_for(algorithm: Algorithm, key: &[u8]) -> Result<Arc<dyn Signer>, ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::MissingKey);
    }

    match algorithm {
        Algorithm::EdDSA => Ok(Arc::new(Ed25519Signer::from_seed(key)?)),
        hmac_alg => Ok(Arc::new(HmacSigner::new(hmac_alg, key)?)),
    }
}

/// HS256 / HS384 / HS512 over a shared secret
#[derive(Clone)]
pub struct HmacSigner {
    algorithm: Algorithm,
    key: Vec<u8>,
}

impl HmacSigner {
    pub fn new(algorithm: Algorithm, key: &[u8]) -> Result<Self, ConfigError> {
        if !algorithm.is_hmac() {
            return Err(ConfigError::UnsupportedAlgorithm(format!(
                "{} is not an HMAC algorithm",
                algorithm
            )));
        }
        if key.is_empty() {
            return Err(ConfigError::MissingKey);
        }

        Ok(HmacSigner {
            algorithm,
            key: key.to_vec(),
        })
    }

    fn mac(&self, message: &[u8]) -> Result<Vec<u8>, AuthError> {
        match self.algorithm {
            Algorithm::HS256 => compute_mac::<Hmac<Sha256>>(&self.key, message),
            Algorithm::HS384 => compute_mac::<Hmac<Sha384>>(&self.key, message),
            Algorithm::HS512 => compute_mac::<Hmac<Sha512>>(&self.key, message),
            Algorithm::EdDSA => Err(AuthError::Signing(
                "EdDSA is not an HMAC algorithm".to_string(),
            )),
        }
    }
}

fn compute_mac<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, AuthError> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|e| AuthError::Signing(format!("hmac key rejected: {}", e)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

impl Signer for HmacSigner {
    fn algorithm(&self) -> &str {
        self.algorithm.as_str()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, AuthError> {
        self.mac(message)
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), AuthError> {
        let expected = self.mac(message)?;
        if mac_matches(&expected, signature) {
            Ok(())
        } else {
            Err(AuthError::InvalidSignature)
        }
    }
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// EdDSA over Ed25519
///
/// A verify-only instance (built from a public key) can gate requests but
/// fails every mint with `AuthError::Signing`.
#[derive(Clone)]
pub struct Ed25519Signer {
    signing_key: Option<SigningKey>,
    verifying_key: VerifyingKey,
}

impl Ed25519Signer {
    /// Create from the 32-byte secret seed
    pub fn from_seed(seed: &[u8]) -> Result<Self, ConfigError> {
        let seed: &[u8; 32] = seed.try_into().map_err(|_| {
            ConfigError::InvalidKey(format!("Ed25519 seed must be 32 bytes, got {}", seed.len()))
        })?;
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();

        Ok(Ed25519Signer {
            signing_key: Some(signing_key),
            verifying_key,
        })
    }

    /// Create a verify-only signer from the 32-byte public key
    pub fn verify_only(public_key: &[u8]) -> Result<Self, ConfigError> {
        let bytes: &[u8; 32] = public_key.try_into().map_err(|_| {
            ConfigError::InvalidKey(format!(
                "Ed25519 public key must be 32 bytes, got {}",
                public_key.len()
            ))
        })?;
        let verifying_key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| ConfigError::InvalidKey(format!("invalid public key: {}", e)))?;

        Ok(Ed25519Signer {
            signing_key: None,
            verifying_key,
        })
    }

    /// Get verifying key bytes
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }
}

impl Signer for Ed25519Signer {
    fn algorithm(&self) -> &str {
        Algorithm::EdDSA.as_str()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, AuthError> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or_else(|| AuthError::Signing("verify-only Ed25519 key".to_string()))?;
        Ok(signing_key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), AuthError> {
        let signature = Signature::from_slice(signature).map_err(|_| AuthError::InvalidSignature)?;
        self.verifying_key
            .verify(message, &signature)
            .map_err(|_| AuthError::InvalidSignature)
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("can_sign", &self.signing_key.is_some())
            .finish_non_exhaustive()
    }
}
