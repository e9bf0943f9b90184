//! Core token lifecycle for jwtgate
//!
//! - Claim set and its typed wire representation
//! - Signing capability with HMAC and Ed25519 built-ins
//! - Token codec: mint, verify, sliding-window refresh
//! - Validated, immutable middleware configuration
//! - Credential and authorization callback interfaces

pub mod callbacks;
pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod signer;
pub mod timing;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use callbacks::*;
pub use claims::*;
pub use codec::*;
pub use config::*;
pub use error::*;
pub use signer::*;

/// Result type alias for request-time operations
pub type Result<T> = std::result::Result<T, AuthError>;
