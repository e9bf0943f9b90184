//! Constant-time equality for MACs and passwords

use subtle::ConstantTimeEq;

/// True when `expected` and `actual` are equal. Runs in time independent of
/// where they first differ; a length mismatch returns early since lengths
/// are not secret.
pub fn mac_matches(expected: &[u8], actual: &[u8]) -> bool {
    expected.len() == actual.len() && bool::from(expected.ct_eq(actual))
}

pub fn password_matches(expected: &str, supplied: &str) -> bool {
    mac_matches(expected.as_bytes(), supplied.as_bytes())
}
