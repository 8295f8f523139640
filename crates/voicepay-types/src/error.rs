//! Error kinds shared across the control plane, dispatcher, and executor
//! bridge (spec §7). Each HTTP-facing crate maps these to status codes in
//! its own `ResponseError`/`IntoResponse` impl.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoicePayError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("ambiguous recipient")]
    AmbiguousRecipient,

    #[error("recipient missing")]
    RecipientMissing,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("chain revert: {0}")]
    ChainRevert(String),

    #[error("rpc unavailable: {0}")]
    RpcUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}
