//! The timestamped HMAC envelope that authenticates every Dispatcher →
//! Executor Bridge call (spec §4.5).
//!
//! The signed message is the exact concatenation `timestamp || body`, where
//! `timestamp` is the ASCII decimal milliseconds-since-epoch string used in
//! the `X-Worker-Timestamp` header. Both [`sign`] and [`verify`] build that
//! concatenation the same way so neither side can drift.

use crate::hmac::{compute_hmac, verify_hmac};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("request timestamp is outside the allowed clock skew")]
    StaleTimestamp,
    #[error("HMAC signature verification failed")]
    BadSignature,
}

fn signing_bytes(timestamp_ms: i64, body: &[u8]) -> Vec<u8> {
    let mut buf = timestamp_ms.to_string().into_bytes();
    buf.extend_from_slice(body);
    buf
}

/// Sign `body` as of `timestamp_ms`. Returns the hex-encoded signature to
/// place in the `X-Worker-Auth` header alongside `X-Worker-Timestamp:
/// timestamp_ms`.
pub fn sign(secret: &[u8], timestamp_ms: i64, body: &[u8]) -> String {
    compute_hmac(secret, &signing_bytes(timestamp_ms, body))
}

/// Verify a signed envelope: the signature must match `timestamp || body`
/// and `timestamp_ms` must be within `clock_skew_secs` of `now_ms` (spec
/// P5/P6).
pub fn verify(
    secret: &[u8],
    timestamp_ms: i64,
    body: &[u8],
    signature: &str,
    now_ms: i64,
    clock_skew_secs: i64,
) -> Result<(), EnvelopeError> {
    let skew_ms = clock_skew_secs.saturating_mul(1000);
    if (now_ms - timestamp_ms).abs() > skew_ms {
        return Err(EnvelopeError::StaleTimestamp);
    }

    if verify_hmac(secret, &signing_bytes(timestamp_ms, body), signature) {
        Ok(())
    } else {
        Err(EnvelopeError::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"shared-preshared-secret";

    #[test]
    fn valid_envelope_is_accepted() {
        let body = br#"{"scheduleId":"abc"}"#;
        let now = 1_700_000_000_000;
        let sig = sign(SECRET, now, body);
        assert_eq!(verify(SECRET, now, body, &sig, now, 300), Ok(()));
    }

    /// P5: a request with |now - timestamp| > 300s is rejected.
    #[test]
    fn stale_timestamp_is_rejected_just_past_the_window() {
        let body = b"payload";
        let timestamp = 1_700_000_000_000;
        let sig = sign(SECRET, timestamp, body);
        let now = timestamp + 301_000;
        assert_eq!(
            verify(SECRET, timestamp, body, &sig, now, 300),
            Err(EnvelopeError::StaleTimestamp)
        );
    }

    /// Scenario 5: accepted at 299s, rejected at 301s.
    #[test]
    fn accepted_within_window_rejected_just_outside() {
        let body = b"payload";
        let timestamp = 1_700_000_000_000;
        let sig = sign(SECRET, timestamp, body);

        let accepted_at = timestamp + 299_000;
        assert!(verify(SECRET, timestamp, body, &sig, accepted_at, 300).is_ok());

        let rejected_at = timestamp + 301_000;
        assert_eq!(
            verify(SECRET, timestamp, body, &sig, rejected_at, 300),
            Err(EnvelopeError::StaleTimestamp)
        );
    }

    /// P6: a one-byte difference in the body is rejected even with a fresh timestamp.
    #[test]
    fn tampered_body_is_rejected() {
        let timestamp = 1_700_000_000_000;
        let sig = sign(SECRET, timestamp, b"original-body");
        assert_eq!(
            verify(SECRET, timestamp, b"original-bodx", &sig, timestamp, 300),
            Err(EnvelopeError::BadSignature)
        );
    }
}
