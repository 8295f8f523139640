use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Errors the Executor Bridge's HTTP handler can surface (spec §4.4, §7).
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("validation error: {0}")]
    Validation(String),

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

impl From<voicepay_shard::ShardError> for ExecutorError {
    fn from(err: voicepay_shard::ShardError) -> Self {
        ExecutorError::Internal(err.to_string())
    }
}

impl ResponseError for ExecutorError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ExecutorError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "ok": false,
                "error": msg,
                "code": "validation",
            })),
            ExecutorError::Forbidden(msg) => HttpResponse::Forbidden().json(serde_json::json!({
                "ok": false,
                "error": msg,
                "code": "forbidden",
            })),
            ExecutorError::Timeout(msg) => HttpResponse::GatewayTimeout().json(serde_json::json!({
                "ok": false,
                "error": msg,
                "code": "timeout",
            })),
            ExecutorError::ChainRevert(msg) => HttpResponse::BadGateway().json(serde_json::json!({
                "ok": false,
                "error": msg,
                "code": "chain_revert",
            })),
            ExecutorError::RpcUnavailable(msg) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ok": false,
                "error": msg,
                "code": "rpc_unavailable",
            })),
            ExecutorError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "ok": false,
                    "error": "internal error",
                    "code": "internal",
                }))
            }
        }
    }
}
