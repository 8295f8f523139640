//! `POST /auth/nonce`, `POST /auth/verify` (spec §4.1 auth state, §6).

use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use voicepay_types::UserAddress;

use crate::auth_token::mint_token;
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NonceRequest {
    pub address: String,
}

#[derive(Serialize)]
pub struct NonceResponse {
    pub nonce: String,
}

#[post("/auth/nonce")]
pub async fn issue_nonce(
    state: web::Data<AppState>,
    body: web::Json<NonceRequest>,
) -> Result<HttpResponse, ApiError> {
    let address = UserAddress::from_str(&body.address)
        .map_err(|e| ApiError(voicepay_types::VoicePayError::Validation(e.to_string())))?;
    let shard = state.shards.get_or_open(address)?;
    let nonce = shard.issue_nonce()?;
    Ok(HttpResponse::Ok().json(NonceResponse { nonce }))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub address: String,
    pub signature: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub token: String,
    pub address: String,
}

#[post("/auth/verify")]
pub async fn verify(
    state: web::Data<AppState>,
    body: web::Json<VerifyRequest>,
) -> Result<HttpResponse, ApiError> {
    let address = UserAddress::from_str(&body.address)
        .map_err(|e| ApiError(voicepay_types::VoicePayError::Validation(e.to_string())))?;
    let shard = state.shards.get_or_open(address.clone())?;

    let recovered = match shard.verify_signature(&body.signature) {
        Ok(a) => a,
        Err(e) => {
            metrics::AUTH_REQUESTS.with_label_values(&["rejected"]).inc();
            return Err(e.into());
        }
    };

    if recovered != address {
        metrics::AUTH_REQUESTS.with_label_values(&["rejected"]).inc();
        return Err(ApiError(voicepay_types::VoicePayError::Unauthorized));
    }

    let issued_at_ms = Utc::now().timestamp_millis();
    let token = mint_token(&state.config.jwt_secret, &address, issued_at_ms);
    metrics::AUTH_REQUESTS.with_label_values(&["accepted"]).inc();

    Ok(HttpResponse::Ok().json(VerifyResponse {
        token,
        address: address.as_str().to_string(),
    }))
}
