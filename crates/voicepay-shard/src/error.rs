//! Errors raised by a single user shard (spec §4.1), convertible into the
//! shared [`VoicePayError`] kinds of spec §7.

use thiserror::Error;
use voicepay_types::VoicePayError;

#[derive(Debug, Error)]
pub enum ShardError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("no login nonce has been issued for this address")]
    NoNonce,

    #[error("signature does not match the issued nonce")]
    InvalidSignature,

    #[error("shard storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("shard directory error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ShardError> for VoicePayError {
    fn from(err: ShardError) -> Self {
        match err {
            ShardError::NotFound(what) => VoicePayError::NotFound(what),
            ShardError::Duplicate(what) => VoicePayError::Duplicate(what),
            ShardError::NoNonce => VoicePayError::Unauthorized,
            ShardError::InvalidSignature => VoicePayError::Unauthorized,
            ShardError::Storage(e) => VoicePayError::Internal(e.to_string()),
            ShardError::Io(e) => VoicePayError::Internal(e.to_string()),
        }
    }
}
