//! HMAC-SHA256 utilities for authenticating Dispatcher → Executor Bridge
//! requests (spec §4.5).
//!
//! The dispatcher signs outgoing requests with [`compute_hmac`], and the
//! executor bridge verifies them with [`verify_hmac`]. All comparisons use
//! constant-time operations to prevent timing attacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 over the given body bytes using the shared secret.
/// Returns the hex-encoded MAC.
pub fn compute_hmac(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify an HMAC-SHA256 signature against the expected body.
///
/// The MAC is always computed, even when `signature` fails to decode as
/// hex, so that the constant-time comparison path is always hit and
/// invalid-hex signatures cannot be distinguished from wrong signatures by
/// timing.
pub fn verify_hmac(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let expected = hex::decode(signature).unwrap_or_default();

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
