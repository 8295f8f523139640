//! `POST /transactions/process-recurring` (spec §4.4, §4.5, §6).

use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use voicepay_types::{Transaction, TransactionStatus, TransactionType, UserAddress};

use crate::chain::PullPaymentRequest;
use crate::error::ExecutorError;
use crate::metrics;
use crate::state::AppState;

/// Validate the HMAC header on an incoming request, mirroring the
/// Dispatcher → Executor Bridge contract (spec §4.5).
fn validate_hmac(req: &HttpRequest, body: &[u8], secret: &[u8], clock_skew_secs: i64) -> Result<(), ExecutorError> {
    let signature = req
        .headers()
        .get("X-Worker-Auth")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            metrics::HMAC_FAILURES.with_label_values(&["missing"]).inc();
            ExecutorError::Forbidden("authentication required".to_string())
        })?;

    let timestamp_ms: i64 = req
        .headers()
        .get("X-Worker-Timestamp")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| {
            metrics::HMAC_FAILURES.with_label_values(&["missing"]).inc();
            ExecutorError::Forbidden("authentication required".to_string())
        })?;

    let now_ms = Utc::now().timestamp_millis();
    voicepay_auth::verify(secret, timestamp_ms, body, signature, now_ms, clock_skew_secs).map_err(|e| {
        tracing::warn!(error = %e, "HMAC verification failed");
        metrics::HMAC_FAILURES.with_label_values(&["invalid"]).inc();
        ExecutorError::Forbidden("authentication failed".to_string())
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecurringRequest {
    pub schedule_id: Uuid,
    pub user_address: String,
    pub recipient: String,
    pub amount: rust_decimal::Decimal,
    pub token: String,
    #[allow(dead_code)]
    pub timestamp: i64,
}

#[derive(Serialize)]
pub struct ProcessRecurringResponse {
    pub ok: bool,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

#[post("/transactions/process-recurring")]
pub async fn process_recurring(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ExecutorError> {
    validate_hmac(
        &req,
        &body,
        &state.config.hmac_shared_secret,
        state.config.hmac_clock_skew_seconds,
    )?;

    let payload: ProcessRecurringRequest = serde_json::from_slice(&body)
        .map_err(|e| ExecutorError::Validation(format!("malformed body: {e}")))?;

    let user_address = UserAddress::from_str(&payload.user_address)
        .map_err(|e| ExecutorError::Validation(e.to_string()))?;
    let recipient = payload
        .recipient
        .parse::<alloy::primitives::Address>()
        .map_err(|e| ExecutorError::Validation(format!("invalid recipient: {e}")))?;
    let from = payload
        .user_address
        .parse::<alloy::primitives::Address>()
        .map_err(|e| ExecutorError::Validation(format!("invalid userAddress: {e}")))?;
    let token = payload
        .token
        .parse::<alloy::primitives::Address>()
        .map_err(|e| ExecutorError::Validation(format!("invalid token: {e}")))?;

    let started = std::time::Instant::now();
    let outcome = state
        .executor
        .pull_payment(PullPaymentRequest {
            token,
            from,
            to: recipient,
            amount: payload.amount,
            schedule_id: payload.schedule_id,
        })
        .await;
    let elapsed = started.elapsed().as_secs_f64();
    let result_label = if outcome.is_ok() { "success" } else { "failure" };
    metrics::FIRE_LATENCY.with_label_values(&[result_label]).observe(elapsed);

    let shard = state.shards.get_or_open(user_address.clone())?;

    match outcome {
        Ok(tx_hash) => {
            metrics::FIRES.with_label_values(&["success"]).inc();
            let tx_hash = format!("{tx_hash}");
            shard.append_transaction(Transaction {
                id: Uuid::new_v4(),
                kind: TransactionType::Recurring,
                name: None,
                address: user_address,
                amount: payload.amount,
                currency: "USDC".to_string(),
                status: TransactionStatus::Completed,
                tx_hash: Some(tx_hash.clone()),
                schedule_id: Some(payload.schedule_id),
                note: None,
                timestamp: Utc::now(),
            })?;
            Ok(HttpResponse::Ok().json(ProcessRecurringResponse {
                ok: true,
                tx_hash: Some(tx_hash),
                error: None,
            }))
        }
        Err(e) => {
            metrics::FIRES.with_label_values(&["failure"]).inc();
            let message = e.to_string();
            shard.append_transaction(Transaction {
                id: Uuid::new_v4(),
                kind: TransactionType::Recurring,
                name: None,
                address: user_address,
                amount: payload.amount,
                currency: "USDC".to_string(),
                status: TransactionStatus::Failed,
                tx_hash: None,
                schedule_id: Some(payload.schedule_id),
                note: Some(message.clone()),
                timestamp: Utc::now(),
            })?;
            let status = match &e {
                ExecutorError::ChainRevert(_) => actix_web::http::StatusCode::BAD_GATEWAY,
                ExecutorError::Timeout(_) => actix_web::http::StatusCode::GATEWAY_TIMEOUT,
                ExecutorError::RpcUnavailable(_) => actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
            };
            Ok(HttpResponse::build(status).json(ProcessRecurringResponse {
                ok: false,
                tx_hash: None,
                error: Some(message),
            }))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(process_recurring).service(metrics::metrics_endpoint);
}
