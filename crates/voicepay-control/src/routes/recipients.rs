//! `GET/POST/PUT/DELETE /recipients` (spec §4.1, §6).

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use voicepay_types::{Recipient, UserAddress, VoicePayError};

use crate::auth_token::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
struct RecipientsResponse {
    recipients: Vec<Recipient>,
}

#[get("/recipients")]
pub async fn list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let shard = state.shards.get_or_open(user.0)?;
    let recipients = shard.get_recipients()?;
    Ok(HttpResponse::Ok().json(RecipientsResponse { recipients }))
}

#[derive(Deserialize)]
pub struct AddRecipientRequest {
    pub name: String,
    pub wallet: String,
    pub note: Option<String>,
}

#[derive(Serialize)]
struct AddRecipientResponse {
    success: bool,
    recipients: Vec<Recipient>,
}

#[post("/recipients")]
pub async fn add(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AddRecipientRequest>,
) -> Result<HttpResponse, ApiError> {
    let wallet = UserAddress::from_str(&body.wallet)
        .map_err(|e| ApiError(VoicePayError::Validation(e.to_string())))?;
    let shard = state.shards.get_or_open(user.0)?;
    shard.add_recipient(Recipient {
        name: body.name.clone(),
        wallet,
        note: body.note.clone(),
    })?;
    let recipients = shard.get_recipients()?;
    Ok(HttpResponse::Ok().json(AddRecipientResponse {
        success: true,
        recipients,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipientRequest {
    pub old_wallet: String,
    pub new_wallet: Option<String>,
    pub new_name: Option<String>,
    pub new_note: Option<String>,
}

#[derive(Serialize)]
struct UpdateRecipientResponse {
    success: bool,
    updated: Recipient,
}

#[put("/recipients")]
pub async fn update(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<UpdateRecipientRequest>,
) -> Result<HttpResponse, ApiError> {
    let old_wallet = UserAddress::from_str(&body.old_wallet)
        .map_err(|e| ApiError(VoicePayError::Validation(e.to_string())))?;
    let shard = state.shards.get_or_open(user.0)?;

    let current = shard
        .get_recipients()?
        .into_iter()
        .find(|r| r.wallet == old_wallet)
        .ok_or_else(|| ApiError(VoicePayError::NotFound(format!("recipient with wallet {old_wallet}"))))?;

    let new_wallet = match &body.new_wallet {
        Some(w) => UserAddress::from_str(w).map_err(|e| ApiError(VoicePayError::Validation(e.to_string())))?,
        None => current.wallet.clone(),
    };

    let updated = Recipient {
        name: body.new_name.clone().unwrap_or(current.name),
        wallet: new_wallet,
        note: body.new_note.clone().or(current.note),
    };

    let updated = shard.update_recipient(&old_wallet, updated)?;
    Ok(HttpResponse::Ok().json(UpdateRecipientResponse {
        success: true,
        updated,
    }))
}

#[derive(Deserialize)]
pub struct DeleteRecipientRequest {
    pub wallet: String,
}

#[derive(Serialize)]
struct DeleteRecipientResponse {
    success: bool,
}

#[delete("/recipients")]
pub async fn remove(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<DeleteRecipientRequest>,
) -> Result<HttpResponse, ApiError> {
    let wallet = UserAddress::from_str(&body.wallet)
        .map_err(|e| ApiError(VoicePayError::Validation(e.to_string())))?;
    let shard = state.shards.get_or_open(user.0)?;
    shard.delete_recipient(&wallet)?;
    Ok(HttpResponse::Ok().json(DeleteRecipientResponse { success: true }))
}
