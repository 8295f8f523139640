//! Timestamped HMAC request signing and verification used for the
//! Dispatcher → Executor Bridge channel, plus the constant-time comparison
//! helper used by bearer-token-gated endpoints (e.g. `/metrics`).

pub mod envelope;
pub mod hmac;
pub mod security;

pub use envelope::{sign, verify, EnvelopeError};
pub use security::constant_time_eq;
