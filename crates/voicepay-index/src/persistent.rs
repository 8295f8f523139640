//! SQLite-backed schedule index so a dispatcher restart doesn't lose track
//! of in-flight due schedules between a tick and the next reload from the
//! shards. Structured the same way as the teacher's `SqliteNonceStore`:
//! one table, opened with `journal_mode=WAL`, entries serialized as JSON.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::Mutex;
use voicepay_types::{IndexEntry, ScheduleId};

use crate::error::IndexError;
use crate::store::ScheduleIndexStore;

pub struct SqliteScheduleIndex {
    conn: Mutex<Connection>,
}

impl SqliteScheduleIndex {
    pub fn open(path: &str) -> Result<Self, IndexError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS index_entries (
                schedule_id TEXT PRIMARY KEY,
                next_run TEXT NOT NULL,
                payload TEXT NOT NULL
            );
            PRAGMA journal_mode=WAL;",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ScheduleIndexStore for SqliteScheduleIndex {
    fn put(&self, entry: IndexEntry) {
        let conn = self.conn.lock().unwrap();
        let payload = serde_json::to_string(&entry).expect("IndexEntry is always serializable");
        let _ = conn.execute(
            "INSERT INTO index_entries (schedule_id, next_run, payload) VALUES (?1, ?2, ?3)
             ON CONFLICT(schedule_id) DO UPDATE SET next_run = excluded.next_run, payload = excluded.payload",
            params![entry.schedule_id.to_string(), entry.next_run.to_rfc3339(), payload],
        );
    }

    fn delete(&self, schedule_id: &ScheduleId) {
        let conn = self.conn.lock().unwrap();
        let _ = conn.execute(
            "DELETE FROM index_entries WHERE schedule_id = ?1",
            params![schedule_id.to_string()],
        );
    }

    fn list_all(&self) -> Vec<IndexEntry> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = match conn.prepare("SELECT payload FROM index_entries") {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };
        stmt.query_map([], |row| row.get::<_, String>(0))
            .map(|rows| {
                rows.filter_map(Result::ok)
                    .filter_map(|payload| serde_json::from_str(&payload).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn list_due(&self, now: DateTime<Utc>) -> Vec<IndexEntry> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = match conn
            .prepare("SELECT payload FROM index_entries WHERE next_run <= ?1")
        {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };
        stmt.query_map(params![now.to_rfc3339()], |row| row.get::<_, String>(0))
            .map(|rows| {
                rows.filter_map(Result::ok)
                    .filter_map(|payload| serde_json::from_str(&payload).ok())
                    .collect()
            })
            .unwrap_or_default()
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
    fn entries_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let id;
        {
            let index = SqliteScheduleIndex::open(path.to_str().unwrap()).unwrap();
            let e = entry(Utc::now());
            id = e.schedule_id;
            index.put(e);
        }
        {
            let index = SqliteScheduleIndex::open(path.to_str().unwrap()).unwrap();
            let all = index.list_all();
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].schedule_id, id);
        }
    }

    #[test]
    fn list_due_filters_by_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let index = SqliteScheduleIndex::open(path.to_str().unwrap()).unwrap();
        let now = Utc::now();
        index.put(entry(now - chrono::Duration::minutes(5)));
        index.put(entry(now + chrono::Duration::days(1)));
        assert_eq!(index.list_due(now).len(), 1);
    }
}
