//! `POST /transactions/setup-recurring`, `GET /transactions`,
//! `POST /transactions/store` (spec §4.3 create-schedule path, §6).

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voicepay_types::{
    IndexEntry, Interval, Schedule, Transaction, TransactionStatus, TransactionType, UserAddress,
    VoicePayError,
};

use crate::auth_token::AuthenticatedUser;
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRecurringRequest {
    pub name: Option<String>,
    pub recipient: String,
    pub amount: rust_decimal::Decimal,
    pub currency: Option<String>,
    pub interval: Interval,
    pub interval_ms: Option<i64>,
    pub start_date: chrono::NaiveDate,
    pub time_of_day: Option<chrono::NaiveTime>,
    pub times: Option<u32>,
    pub note: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRecurringResponse {
    pub ok: bool,
    pub schedule: Schedule,
    pub contract_address: Option<String>,
}

/// Spec §4.3 create-schedule path: validate, compute the initial `nextRun`,
/// append the Schedule, then mirror it into the global index.
#[post("/transactions/setup-recurring")]
pub async fn setup_recurring(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<SetupRecurringRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.amount <= rust_decimal::Decimal::ZERO {
        return Err(ApiError(VoicePayError::Validation("amount must be positive".to_string())));
    }
    let recipient = body
        .recipient
        .parse::<UserAddress>()
        .map_err(|e| ApiError(VoicePayError::Validation(e.to_string())))?;

    let next_run = Schedule::initial_next_run(body.start_date, body.time_of_day);
    let now = Utc::now();

    let schedule = Schedule {
        id: Uuid::new_v4(),
        name: body.name.clone(),
        recipient,
        amount: body.amount,
        currency: body.currency.clone().unwrap_or_else(|| "USDC".to_string()),
        interval: body.interval,
        interval_ms: body.interval_ms,
        start_date: body.start_date,
        time_of_day: body.time_of_day,
        times_total: body.times,
        times_remaining: body.times,
        note: body.note.clone(),
        next_run,
        created_at: now,
        active: true,
    };

    let shard = state.shards.get_or_open(user.0.clone())?;
    let schedule = shard.append_schedule(schedule)?;

    let entry = IndexEntry::from_schedule(user.0, &schedule);
    state.index.put(entry);

    metrics::SCHEDULES_CREATED
        .with_label_values(&[interval_label(schedule.interval)])
        .inc();

    Ok(HttpResponse::Ok().json(SetupRecurringResponse {
        ok: true,
        schedule,
        contract_address: None,
    }))
}

fn interval_label(interval: Interval) -> &'static str {
    match interval {
        Interval::Daily => "daily",
        Interval::Weekly => "weekly",
        Interval::Monthly => "monthly",
        Interval::Yearly => "yearly",
        Interval::Custom => "custom",
    }
}

#[derive(Serialize)]
struct TransactionsResponse {
    transactions: Vec<Transaction>,
}

#[get("/transactions")]
pub async fn list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let shard = state.shards.get_or_open(user.0)?;
    let transactions = shard.list_transactions()?;
    Ok(HttpResponse::Ok().json(TransactionsResponse { transactions }))
}

#[derive(Deserialize)]
pub struct StoreTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub name: Option<String>,
    pub amount: rust_decimal::Decimal,
    pub currency: Option<String>,
    pub status: TransactionStatus,
    pub tx_hash: Option<String>,
    pub schedule_id: Option<uuid::Uuid>,
    pub note: Option<String>,
}

#[derive(Serialize)]
struct StoreTransactionResponse {
    success: bool,
    stored: Transaction,
}

/// Lets a send-once flow (handled entirely client-side against the chain)
/// record its outcome in the caller's shard without going through the
/// Dispatcher/Executor Bridge path.
#[post("/transactions/store")]
pub async fn store(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<StoreTransactionRequest>,
) -> Result<HttpResponse, ApiError> {
    let shard = state.shards.get_or_open(user.0.clone())?;
    let transaction = Transaction {
        id: Uuid::new_v4(),
        kind: body.kind,
        name: body.name.clone(),
        address: user.0,
        amount: body.amount,
        currency: body.currency.clone().unwrap_or_else(|| "USDC".to_string()),
        status: body.status,
        tx_hash: body.tx_hash.clone(),
        schedule_id: body.schedule_id,
        note: body.note.clone(),
        timestamp: Utc::now(),
    };
    let stored = shard.append_transaction(transaction)?;
    Ok(HttpResponse::Ok().json(StoreTransactionResponse { success: true, stored }))
}
