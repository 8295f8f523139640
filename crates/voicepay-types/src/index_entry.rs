use crate::address::UserAddress;
use crate::schedule::{Interval, Schedule, ScheduleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flat projection of a [`Schedule`] sufficient for dispatch without
/// touching the owning shard (spec §3 IndexEntry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub schedule_id: ScheduleId,
    pub user_address: UserAddress,
    pub next_run: DateTime<Utc>,
    pub recipient: UserAddress,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    pub interval: Interval,
    pub interval_ms: Option<i64>,
    pub times_remaining: Option<u32>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IndexEntry {
    pub fn from_schedule(user_address: UserAddress, schedule: &Schedule) -> Self {
        Self {
            schedule_id: schedule.id,
            user_address,
            next_run: schedule.next_run,
            recipient: schedule.recipient.clone(),
            amount: schedule.amount,
            currency: schedule.currency.clone(),
            interval: schedule.interval,
            interval_ms: schedule.interval_ms,
            times_remaining: schedule.times_remaining,
            name: schedule.name.clone(),
            note: schedule.note.clone(),
            created_at: schedule.created_at,
        }
    }
}
