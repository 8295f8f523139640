//! The Dispatcher's tick algorithm (spec §4.3).
//!
//! One call to [`run_tick`] scans the schedule index, fires every due
//! schedule, and advances or retires it in both the index and the owning
//! shard. Distinct schedules fire concurrently; the same `scheduleId` is
//! never fired twice within a tick, via the in-flight guard in
//! [`crate::guard::InFlightGuard`].
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use voicepay_index::ScheduleIndexStore;
use voicepay_shard::ShardRegistry;
use voicepay_types::{advance, IndexEntry, Transaction, TransactionStatus, TransactionType};

use crate::client::{call_process_recurring, ProcessRecurringPayload};
use crate::guard::InFlightGuard;

pub struct TickContext {
    pub http_client: reqwest::Client,
    pub executor_url: String,
    pub hmac_shared_secret: Vec<u8>,
    pub dispatch_timeout: std::time::Duration,
    pub retry_backoff_seconds: i64,
    pub shards: Arc<ShardRegistry>,
    pub index: Arc<dyn ScheduleIndexStore>,
    pub in_flight: Arc<InFlightGuard>,
}

/// Outcome of firing one schedule, returned for logging/metrics at the
/// call site rather than handled here.
pub enum FireOutcome {
    Fired { schedule_id: Uuid },
    Skipped { schedule_id: Uuid },
    Failed { schedule_id: Uuid, reason: String },
}

/// Scan the index and fire every due schedule. Returns one [`FireOutcome`]
/// per entry considered.
pub async fn run_tick(ctx: &TickContext) -> Vec<FireOutcome> {
    let now = Utc::now();
    let due = ctx.index.list_due(now);

    let futures = due.into_iter().map(|entry| fire_one(ctx, entry, now));
    futures::future::join_all(futures).await
}

async fn fire_one(ctx: &TickContext, entry: IndexEntry, now: chrono::DateTime<Utc>) -> FireOutcome {
    let schedule_id = entry.schedule_id;

    let Some(_permit) = ctx.in_flight.try_acquire(schedule_id) else {
        return FireOutcome::Skipped { schedule_id };
    };

    let payload = ProcessRecurringPayload {
        schedule_id,
        user_address: entry.user_address.clone(),
        recipient: entry.recipient.clone(),
        amount: entry.amount,
        token: entry.currency.clone(),
        timestamp: now.timestamp_millis(),
    };

    let result = call_process_recurring(
        &ctx.http_client,
        &ctx.executor_url,
        &ctx.hmac_shared_secret,
        &payload,
        ctx.dispatch_timeout,
    )
    .await;

    let shard = match ctx.shards.get_or_open(entry.user_address.clone()) {
        Ok(shard) => shard,
        Err(e) => return FireOutcome::Failed { schedule_id, reason: e.to_string() },
    };

    match result {
        Ok(response) if response.ok => {
            if let Err(e) = record_success(ctx, &shard, &entry, now, response.tx_hash) {
                return FireOutcome::Failed { schedule_id, reason: e };
            }
            FireOutcome::Fired { schedule_id }
        }
        Ok(response) => {
            let reason = response.error.unwrap_or_else(|| "executor reported failure".to_string());
            if let Err(e) = record_failure(ctx, &shard, &entry, now, &reason) {
                return FireOutcome::Failed { schedule_id, reason: e };
            }
            FireOutcome::Failed { schedule_id, reason }
        }
        Err(e) => {
            let reason = e.to_string();
            if let Err(write_err) = record_failure(ctx, &shard, &entry, now, &reason) {
                return FireOutcome::Failed { schedule_id, reason: write_err };
            }
            FireOutcome::Failed { schedule_id, reason }
        }
    }
}

/// Spec §4.3 step 4: append a `completed` Transaction, decrement
/// `times_remaining`, advance `nextRun`, and retire the schedule if
/// exhausted.
fn record_success(
    ctx: &TickContext,
    shard: &voicepay_shard::Shard,
    entry: &IndexEntry,
    now: chrono::DateTime<Utc>,
    tx_hash: Option<String>,
) -> Result<(), String> {
    shard
        .append_transaction(Transaction {
            id: Uuid::new_v4(),
            kind: TransactionType::Recurring,
            name: entry.name.clone(),
            address: entry.user_address.clone(),
            amount: entry.amount,
            currency: entry.currency.clone(),
            status: TransactionStatus::Completed,
            tx_hash,
            schedule_id: Some(entry.schedule_id),
            note: None,
            timestamp: now,
        })
        .map_err(|e| e.to_string())?;

    let mut schedule = shard.get_schedule(entry.schedule_id).map_err(|e| e.to_string())?;
    let times_remaining = schedule.times_remaining.map(|r| r.saturating_sub(1));
    schedule.times_remaining = times_remaining;
    schedule.next_run = advance(schedule.next_run, schedule.interval, schedule.interval_ms);

    let exhausted = matches!(times_remaining, Some(0));
    if exhausted {
        schedule.active = false;
        ctx.index.delete(&entry.schedule_id);
    } else {
        ctx.index.put(IndexEntry::from_schedule(entry.user_address.clone(), &schedule));
    }
    shard.update_schedule(schedule).map_err(|e| e.to_string())?;

    Ok(())
}

/// Spec §4.3 step 5: append a `failed` Transaction, push `nextRun` out by
/// the retry backoff, and leave `times_remaining` untouched.
fn record_failure(
    ctx: &TickContext,
    shard: &voicepay_shard::Shard,
    entry: &IndexEntry,
    now: chrono::DateTime<Utc>,
    reason: &str,
) -> Result<(), String> {
    shard
        .append_transaction(Transaction {
            id: Uuid::new_v4(),
            kind: TransactionType::Recurring,
            name: entry.name.clone(),
            address: entry.user_address.clone(),
            amount: entry.amount,
            currency: entry.currency.clone(),
            status: TransactionStatus::Failed,
            tx_hash: None,
            schedule_id: Some(entry.schedule_id),
            note: Some(reason.to_string()),
            timestamp: now,
        })
        .map_err(|e| e.to_string())?;

    let mut schedule = shard.get_schedule(entry.schedule_id).map_err(|e| e.to_string())?;
    schedule.next_run = now + chrono::Duration::seconds(ctx.retry_backoff_seconds);

    ctx.index.put(IndexEntry::from_schedule(entry.user_address.clone(), &schedule));
    shard.update_schedule(schedule).map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::InFlightGuard;
    use rust_decimal::Decimal;
    use voicepay_types::{Interval, Schedule};

    fn sample_entry(schedule_id: Uuid, next_run: chrono::DateTime<Utc>) -> IndexEntry {
        IndexEntry {
            schedule_id,
            user_address: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            next_run,
            recipient: "0x2222222222222222222222222222222222222222".parse().unwrap(),
            amount: Decimal::from(5),
            currency: "USDC".to_string(),
            interval: Interval::Daily,
            interval_ms: None,
            times_remaining: Some(1),
            name: None,
            note: None,
            created_at: Utc::now(),
        }
    }

    /// Scenario 3: executor failure pushes `nextRun` out by the retry
    /// backoff and leaves `times_remaining` untouched (I4).
    #[test]
    fn record_failure_advances_next_run_by_backoff_and_keeps_times_remaining() {
        let shard = voicepay_shard::Shard::open_in_memory("0x1111111111111111111111111111111111111111".parse().unwrap()).unwrap();
        let now = Utc::now();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            name: None,
            recipient: "0x2222222222222222222222222222222222222222".parse().unwrap(),
            amount: Decimal::from(5),
            currency: "USDC".to_string(),
            interval: Interval::Daily,
            interval_ms: None,
            start_date: now.date_naive(),
            time_of_day: None,
            times_total: Some(3),
            times_remaining: Some(3),
            note: None,
            next_run: now,
            created_at: now,
            active: true,
        };
        let schedule = shard.append_schedule(schedule).unwrap();
        let entry = sample_entry(schedule.id, now);

        let ctx = TickContext {
            http_client: reqwest::Client::new(),
            executor_url: "http://unused".to_string(),
            hmac_shared_secret: vec![],
            dispatch_timeout: std::time::Duration::from_secs(30),
            retry_backoff_seconds: 600,
            shards: Arc::new(ShardRegistry::new(std::env::temp_dir())),
            index: Arc::new(voicepay_index::ScheduleIndex::default()),
            in_flight: Arc::new(InFlightGuard::default()),
        };

        record_failure(&ctx, &shard, &entry, now, "chain revert").unwrap();

        let updated = shard.get_schedule(schedule.id).unwrap();
        assert_eq!(updated.times_remaining, Some(3));
        assert_eq!(updated.next_run, now + chrono::Duration::seconds(600));

        let txs = shard.list_transactions().unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].status, TransactionStatus::Failed);
    }

    /// P3: a schedule that reaches `times_remaining = 0` is removed from
    /// the index and retired in the shard.
    #[test]
    fn record_success_retires_schedule_once_exhausted() {
        let shard = voicepay_shard::Shard::open_in_memory("0x1111111111111111111111111111111111111111".parse().unwrap()).unwrap();
        let now = Utc::now();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            name: None,
            recipient: "0x2222222222222222222222222222222222222222".parse().unwrap(),
            amount: Decimal::from(5),
            currency: "USDC".to_string(),
            interval: Interval::Daily,
            interval_ms: None,
            start_date: now.date_naive(),
            time_of_day: None,
            times_total: Some(1),
            times_remaining: Some(1),
            note: None,
            next_run: now,
            created_at: now,
            active: true,
        };
        let schedule = shard.append_schedule(schedule).unwrap();
        let entry = sample_entry(schedule.id, now);
        let index = Arc::new(voicepay_index::ScheduleIndex::default());
        index.put(entry.clone());

        let ctx = TickContext {
            http_client: reqwest::Client::new(),
            executor_url: "http://unused".to_string(),
            hmac_shared_secret: vec![],
            dispatch_timeout: std::time::Duration::from_secs(30),
            retry_backoff_seconds: 600,
            shards: Arc::new(ShardRegistry::new(std::env::temp_dir())),
            index: index.clone(),
            in_flight: Arc::new(InFlightGuard::default()),
        };

        record_success(&ctx, &shard, &entry, now, Some("0xabc".to_string())).unwrap();

        let updated = shard.get_schedule(schedule.id).unwrap();
        assert_eq!(updated.times_remaining, Some(0));
        assert!(!updated.active);
        assert!(index.list_all().is_empty());
    }
}
