//! Claim set carried inside every token

use serde::{Deserialize, Deserializer, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub type UnixTime = u64;

/// Current wall-clock time in whole seconds.
pub fn unix_now() -> UnixTime {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The payload embedded in a token.
///
/// Field names on the wire are `id`, `exp` and `orig_iat`. Decoding is typed,
/// so a payload with a missing or mistyped required field never becomes a
/// `ClaimSet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Authenticated principal
    #[serde(rename = "id")]
    pub identity: String,

    /// Token is invalid once `now >= expires_at`
    #[serde(rename = "exp", deserialize_with = "numeric_date")]
    pub expires_at: UnixTime,

    /// Original issuance time, only present when refresh is enabled
    #[serde(
        rename = "orig_iat",
        default,
        deserialize_with = "optional_numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub issued_at: Option<UnixTime>,
}

/// JSON numbers as other JWT libraries write them: integers, or floats with
/// no fractional part (`1700000000.0`).
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericDate {
    Integer(u64),
    Float(f64),
}

impl NumericDate {
    fn into_unix_time(self) -> Option<UnixTime> {
        match self {
            NumericDate::Integer(secs) => Some(secs),
            NumericDate::Float(secs)
                if secs.fract() == 0.0 && (0.0..=u64::MAX as f64).contains(&secs) =>
            {
                Some(secs as u64)
            }
            NumericDate::Float(_) => None,
        }
    }
}

fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UnixTime, D::Error> {
    numeric_date_value(NumericDate::deserialize(deserializer)?)
}

fn optional_numeric_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<UnixTime>, D::Error> {
    match Option::<NumericDate>::deserialize(deserializer)? {
        Some(date) => numeric_date_value(date).map(Some),
        None => Ok(None),
    }
}

fn numeric_date_value<E: serde::de::Error>(date: NumericDate) -> Result<UnixTime, E> {
    date.into_unix_time()
        .ok_or_else(|| E::custom("timestamp must be a whole number of seconds"))
}

impl ClaimSet {
    pub(crate) fn new(
        identity: &str,
        now: UnixTime,
        timeout: Duration,
        issued_at: Option<UnixTime>,
    ) -> Self {
        ClaimSet {
            identity: identity.to_string(),
            expires_at: now.saturating_add(timeout.as_secs()),
            issued_at,
        }
    }

    /// Check expiry against `now`
    pub fn is_expired_at(&self, now: UnixTime) -> bool {
        now >= self.expires_at
    }

    /// Seconds left before expiry (zero once expired)
    pub fn remaining_secs(&self, now: UnixTime) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}
