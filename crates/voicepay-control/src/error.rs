//! Maps [`VoicePayError`] to HTTP responses, following the teacher's
//! `GatewayError::error_response` shape: one arm per kind, internal details
//! logged but never echoed to the caller.

use actix_web::{HttpResponse, ResponseError};
use voicepay_types::VoicePayError;

#[derive(Debug)]
pub struct ApiError(pub VoicePayError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<VoicePayError> for ApiError {
    fn from(err: VoicePayError) -> Self {
        ApiError(err)
    }
}

impl From<voicepay_shard::ShardError> for ApiError {
    fn from(err: voicepay_shard::ShardError) -> Self {
        ApiError(err.into())
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match &self.0 {
            VoicePayError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation",
                "message": msg,
            })),
            VoicePayError::NotFound(what) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "not_found",
                "message": what,
            })),
            VoicePayError::Duplicate(what) => HttpResponse::Conflict().json(serde_json::json!({
                "error": "duplicate",
                "message": what,
            })),
            VoicePayError::AmbiguousRecipient => HttpResponse::Conflict().json(serde_json::json!({
                "error": "ambiguous_recipient",
            })),
            VoicePayError::RecipientMissing => HttpResponse::UnprocessableEntity().json(serde_json::json!({
                "error": "recipient_missing",
            })),
            VoicePayError::Unauthorized => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "unauthorized",
            })),
            VoicePayError::Forbidden(msg) => HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden",
                "message": msg,
            })),
            VoicePayError::Timeout(msg) => HttpResponse::GatewayTimeout().json(serde_json::json!({
                "error": "timeout",
                "message": msg,
            })),
            VoicePayError::ChainRevert(msg) => HttpResponse::BadGateway().json(serde_json::json!({
                "error": "chain_revert",
                "message": msg,
            })),
            VoicePayError::RpcUnavailable(msg) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "rpc_unavailable",
                "message": msg,
            })),
            VoicePayError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal",
                }))
            }
        }
    }
}
