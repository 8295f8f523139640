//! The global due-schedule projection (spec §4.2).
//!
//! Mirrors the shape of the teacher's [`InMemoryNonceStore`]: a `DashMap`
//! behind a handful of narrow methods, with no knowledge of what owns the
//! entries it holds.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use voicepay_types::{IndexEntry, ScheduleId};

/// Backend contract for the schedule index, so the dispatcher can run
/// against either the in-memory default or [`crate::persistent::SqliteScheduleIndex`]
/// without caring which.
pub trait ScheduleIndexStore: Send + Sync {
    fn put(&self, entry: IndexEntry);
    fn delete(&self, schedule_id: &ScheduleId);
    fn list_all(&self) -> Vec<IndexEntry>;
    fn list_due(&self, now: DateTime<Utc>) -> Vec<IndexEntry> {
        self.list_all()
            .into_iter()
            .filter(|e| e.next_run <= now)
            .collect()
    }
}

/// In-memory schedule index. The default backend: fast, and rebuilt from
/// each shard's schedules on dispatcher startup since it doesn't survive a
/// restart on its own.
#[derive(Default)]
pub struct ScheduleIndex {
    entries: DashMap<ScheduleId, IndexEntry>,
}

impl ScheduleIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScheduleIndexStore for ScheduleIndex {
    fn put(&self, entry: IndexEntry) {
        self.entries.insert(entry.schedule_id, entry);
    }

    fn delete(&self, schedule_id: &ScheduleId) {
        self.entries.remove(schedule_id);
    }

    fn list_all(&self) -> Vec<IndexEntry> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn entry(next_run: DateTime<Utc>) -> IndexEntry {
        IndexEntry {
            schedule_id: Uuid::new_v4(),
            user_address: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            next_run,
            recipient: "0x2222222222222222222222222222222222222222".parse().unwrap(),
            amount: Decimal::new(100, 0),
            currency: "USDC".to_string(),
            interval: voicepay_types::Interval::Daily,
            interval_ms: None,
            times_remaining: None,
            name: None,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn put_then_list_all_returns_the_entry() {
        let index = ScheduleIndex::new();
        let e = entry(Utc::now());
        let id = e.schedule_id;
        index.put(e);
        let all = index.list_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].schedule_id, id);
    }

    #[test]
    fn delete_removes_the_entry() {
        let index = ScheduleIndex::new();
        let e = entry(Utc::now());
        let id = e.schedule_id;
        index.put(e);
        index.delete(&id);
        assert!(index.list_all().is_empty());
    }

    #[test]
    fn list_due_excludes_future_schedules() {
        let index = ScheduleIndex::new();
        let now = Utc::now();
        index.put(entry(now - chrono::Duration::minutes(1)));
        index.put(entry(now + chrono::Duration::hours(1)));
        let due = index.list_due(now);
        assert_eq!(due.len(), 1);
    }
}
