use crate::address::UserAddress;
use crate::schedule::ScheduleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    SendOnce,
    Recurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Failed,
}

/// Append-only record of a payment attempt (spec §3 Transaction).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub name: Option<String>,
    pub address: UserAddress,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub tx_hash: Option<String>,
    pub schedule_id: Option<ScheduleId>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}
