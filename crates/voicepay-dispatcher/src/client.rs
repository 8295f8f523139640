//! HTTP client for calling the Executor Bridge's
//! `/transactions/process-recurring` endpoint, following the teacher's
//! `call_verify_and_settle` shape: build the body once, HMAC-sign it, and
//! parse the JSON response.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voicepay_types::UserAddress;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecurringPayload {
    pub schedule_id: Uuid,
    pub user_address: UserAddress,
    pub recipient: UserAddress,
    pub amount: rust_decimal::Decimal,
    pub token: String,
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecurringResponse {
    pub ok: bool,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("executor returned an error: {0}")]
    ExecutorRejected(String),
    #[error("malformed executor response: {0}")]
    MalformedResponse(String),
}

/// Sign and send one fire request to the Executor Bridge.
pub async fn call_process_recurring(
    client: &reqwest::Client,
    executor_url: &str,
    hmac_secret: &[u8],
    payload: &ProcessRecurringPayload,
    timeout: std::time::Duration,
) -> Result<ProcessRecurringResponse, DispatchError> {
    let url = format!("{}/transactions/process-recurring", executor_url.trim_end_matches('/'));
    let body_bytes = serde_json::to_vec(payload).map_err(|e| DispatchError::Request(e.to_string()))?;

    let timestamp_ms = Utc::now().timestamp_millis();
    let signature = voicepay_auth::sign(hmac_secret, timestamp_ms, &body_bytes);

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("X-Worker-Auth", signature)
        .header("X-Worker-Timestamp", timestamp_ms.to_string())
        .timeout(timeout)
        .body(body_bytes)
        .send()
        .await
        .map_err(|e| DispatchError::Request(e.to_string()))?;

    let status = response.status();
    let parsed: ProcessRecurringResponse = response
        .json()
        .await
        .map_err(|e| DispatchError::MalformedResponse(e.to_string()))?;

    if !status.is_success() && !parsed.ok {
        return Err(DispatchError::ExecutorRejected(
            parsed.error.clone().unwrap_or_else(|| format!("status {status}")),
        ));
    }

    Ok(parsed)
}
