//! Test utilities shared by the jwtgate crates

use crate::callbacks::StaticUsers;
use crate::config::{JwtConfig, JwtConfigBuilder};
use crate::signer::{Algorithm, HmacSigner, Signer};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::time::{Duration, Instant};

pub const TEST_REALM: &str = "test zone";
pub const TEST_KEY: &[u8] = b"secret key";
pub const TEST_USER: &str = "alice";
pub const TEST_PASSWORD: &str = "secret";

/// Builder preloaded with realm, HS256 test key and a single user
/// (`alice` / `secret`)
pub fn test_config_builder() -> JwtConfigBuilder {
    JwtConfig::builder()
        .realm(TEST_REALM)
        .key(TEST_KEY)
        .authenticator(StaticUsers::new().with_user(TEST_USER, TEST_PASSWORD))
}

/// Sign an arbitrary header/payload pair with the HS256 test key.
///
/// Lets tests produce correctly signed tokens whose contents the codec would
/// never mint.
pub fn forge_hs256(header_json: &str, payload_json: &str) -> String {
    let signer = HmacSigner::new(Algorithm::HS256, TEST_KEY).expect("test key is valid");
    let input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload_json)
    );
    let signature = signer.sign(input.as_bytes()).expect("hmac signing cannot fail");
    format!("{}.{}", input, URL_SAFE_NO_PAD.encode(signature))
}

/// `Authorization` header value for `token`
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Latency sampling for coarse performance assertions
#[derive(Default)]
pub struct PerfAssert {
    samples: Vec<Duration>,
}

impl PerfAssert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_operation<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.samples.push(start.elapsed());
        result
    }

    pub fn percentile(&mut self, p: f64) -> Duration {
        assert!((0.0..=100.0).contains(&p), "Percentile must be between 0 and 100");
        assert!(!self.samples.is_empty(), "No samples recorded");

        self.samples.sort();
        let index = ((p / 100.0) * (self.samples.len() - 1) as f64).round() as usize;
        self.samples[index]
    }

    pub fn p95(&mut self) -> Duration {
        self.percentile(95.0)
    }

    pub fn assert_p95_under_ms(&mut self, max_ms: u64) {
        let p95 = self.p95();
        assert!(
            p95 <= Duration::from_millis(max_ms),
            "p95 latency {} ms exceeds maximum {} ms",
            p95.as_millis(),
            max_ms
        );
    }
}
