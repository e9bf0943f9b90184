//! Property-based tests for the token lifecycle

use jwtgate_core::test_utils::*;
use jwtgate_core::*;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const B64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn codec(timeout_secs: u64, refreshable: bool) -> TokenCodec {
    let signer = HmacSigner::new(Algorithm::HS256, TEST_KEY).unwrap();
    TokenCodec::new(Arc::new(signer), Duration::from_secs(timeout_secs), refreshable)
}

/// Replace one character of `segment` (0 = header, 1 = payload, 2 = signature)
fn tamper(token: &str, segment: usize, position: usize, replacement: usize) -> String {
    let mut start = 0;
    for part in token.split('.').take(segment) {
        start += part.len() + 1;
    }
    let len = token.split('.').nth(segment).unwrap().len();
    let index = start + position % len;

    let mut bytes = token.as_bytes().to_vec();
    let original = bytes[index];
    let mut candidate = B64URL[replacement % B64URL.len()];
    if candidate == original {
        candidate = B64URL[(replacement + 1) % B64URL.len()];
    }
    bytes[index] = candidate;
    String::from_utf8(bytes).unwrap()
}

proptest! {
    #[test]
    fn props_mint_then_verify_returns_identity(
        identity in "\\PC{1,48}",
        timeout in 1u64..10_000_000,
        now in 1_000_000_000u64..2_000_000_000,
    ) {
        let codec = codec(timeout, false);
        let token = codec.mint_at(&identity, None, now).unwrap();
        let claims = codec.verify_at(&token, now).unwrap();

        prop_assert_eq!(claims.identity, identity);
        prop_assert_eq!(claims.expires_at, now + timeout);
        prop_assert_eq!(claims.issued_at, None);
    }

    #[test]
    fn props_expiry_boundary(
        timeout in 1u64..1_000_000,
        now in 1_000_000_000u64..2_000_000_000,
    ) {
        let codec = codec(timeout, false);

        // exp = now - 1
        let stale = codec.mint_at("alice", None, now - timeout - 1).unwrap();
        prop_assert_eq!(codec.verify_at(&stale, now), Err(AuthError::Expired));

        // exp = now + 1
        let fresh = codec.mint_at("alice", None, now + 1 - timeout).unwrap();
        prop_assert!(codec.verify_at(&fresh, now).is_ok());
    }

    #[test]
    fn props_tampered_payload_never_verifies(
        identity in "[a-z]{1,16}",
        position in any::<usize>(),
        replacement in any::<usize>(),
    ) {
        let codec = codec(3600, true);
        let now = 1_700_000_000;
        let token = codec.mint_at(&identity, None, now).unwrap();
        let tampered = tamper(&token, 1, position, replacement);

        let result = codec.verify_at(&tampered, now);
        prop_assert!(
            matches!(result, Err(AuthError::InvalidSignature) | Err(AuthError::Malformed)),
            "tampered payload gave {:?}", result
        );
    }

    #[test]
    fn props_tampered_signature_never_verifies(
        identity in "[a-z]{1,16}",
        position in any::<usize>(),
        replacement in any::<usize>(),
    ) {
        let codec = codec(3600, false);
        let now = 1_700_000_000;
        let token = codec.mint_at(&identity, None, now).unwrap();
        let tampered = tamper(&token, 2, position, replacement);

        let result = codec.verify_at(&tampered, now);
        prop_assert!(
            matches!(result, Err(AuthError::InvalidSignature) | Err(AuthError::Malformed)),
            "tampered signature gave {:?}", result
        );
    }

    #[test]
    fn props_refresh_preserves_issued_at(
        timeout in 60u64..100_000,
        max_refresh in 1u64..1_000_000,
        delta_fraction in 0.0f64..1.0,
        t0 in 1_000_000_000u64..2_000_000_000,
    ) {
        let codec = codec(timeout, true);
        let delta = ((max_refresh - 1) as f64 * delta_fraction) as u64;
        let now = t0 + delta;

        let token = codec.mint_at("alice", None, t0).unwrap();
        // the gate would reject an expired token before refresh is reached
        let claims = codec.verify_at(&token, t0).unwrap();
        let refreshed = codec
            .refresh_at(&claims, Duration::from_secs(max_refresh), now)
            .unwrap();
        let new_claims = codec.verify_at(&refreshed, now).unwrap();

        prop_assert_eq!(new_claims.identity, "alice");
        prop_assert_eq!(new_claims.issued_at, Some(t0));
        prop_assert_eq!(new_claims.expires_at, t0 + delta + timeout);
    }

    #[test]
    fn props_refresh_window_is_inclusive(
        max_refresh in 1u64..1_000_000,
        t0 in 1_000_000_000u64..2_000_000_000,
    ) {
        let codec = codec(3600, true);
        let claims = ClaimSet {
            identity: "alice".to_string(),
            expires_at: u64::MAX,
            issued_at: Some(t0),
        };
        let window = Duration::from_secs(max_refresh);

        prop_assert!(codec.refresh_at(&claims, window, t0 + max_refresh).is_ok());
        prop_assert_eq!(
            codec.refresh_at(&claims, window, t0 + max_refresh + 1),
            Err(AuthError::RefreshWindowExpired)
        );
    }
}

#[cfg(test)]
mod clock_tests {
    use super::*;

    #[test]
    fn test_wall_clock_expiry_range() {
        let codec = codec(3600, false);
        let before = unix_now();
        let token = codec.mint("alice", None).unwrap();
        let after = unix_now();

        let claims = codec.verify(&token).unwrap();
        assert!(claims.expires_at >= before + 3600);
        assert!(claims.expires_at <= after + 3600);
    }

    #[test]
    fn test_refreshed_token_is_a_new_string() {
        let codec = codec(3600, true);
        let t0 = 1_700_000_000;
        let token = codec.mint_at("alice", None, t0).unwrap();
        let claims = codec.verify_at(&token, t0).unwrap();

        let refreshed = codec.refresh_at(&claims, Duration::from_secs(60), t0 + 5).unwrap();
        assert_ne!(refreshed, token);
        // the old token is untouched and still valid on its own
        assert_eq!(codec.verify_at(&token, t0 + 5).unwrap(), claims);
    }

    #[test]
    fn test_verify_latency() {
        let codec = codec(3600, false);
        let token = codec.mint("alice", None).unwrap();
        let mut perf = PerfAssert::new();

        for _ in 0..200 {
            perf.record_operation(|| codec.verify(&token).unwrap());
        }

        perf.assert_p95_under_ms(5);
    }
}
