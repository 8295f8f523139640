//! Schema and row-level CRUD for a single shard's SQLite database.
//!
//! Every function here takes an already-locked [`rusqlite::Connection`] and
//! knows nothing about sharding or concurrency; that lives in [`crate::shard`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use uuid::Uuid;
use voicepay_types::{
    AuthState, Interval, Recipient, Schedule, ScheduleId, Transaction, TransactionStatus,
    TransactionType, UserAddress,
};

use crate::error::ShardError;

pub fn init_schema(conn: &Connection) -> Result<(), ShardError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;

        CREATE TABLE IF NOT EXISTS recipients (
            wallet TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            note TEXT
        );

        CREATE TABLE IF NOT EXISTS schedules (
            id TEXT PRIMARY KEY,
            name TEXT,
            recipient TEXT NOT NULL,
            amount TEXT NOT NULL,
            currency TEXT NOT NULL,
            interval TEXT NOT NULL,
            interval_ms INTEGER,
            start_date TEXT NOT NULL,
            time_of_day TEXT,
            times_total INTEGER,
            times_remaining INTEGER,
            note TEXT,
            next_run TEXT NOT NULL,
            created_at TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            name TEXT,
            address TEXT NOT NULL,
            amount TEXT NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL,
            tx_hash TEXT,
            schedule_id TEXT,
            note TEXT,
            timestamp TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS auth_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            nonce TEXT,
            updated_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_timestamp ON transactions(timestamp);
        "#,
    )?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// --- recipients -------------------------------------------------------

pub fn insert_recipient(conn: &Connection, recipient: &Recipient) -> Result<(), ShardError> {
    conn.execute(
        "INSERT INTO recipients (wallet, name, note) VALUES (?1, ?2, ?3)",
        params![recipient.wallet.as_str(), recipient.name, recipient.note],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            ShardError::Duplicate(format!("wallet {}", recipient.wallet))
        } else {
            ShardError::Storage(e)
        }
    })?;
    Ok(())
}

pub fn list_recipients(conn: &Connection) -> Result<Vec<Recipient>, ShardError> {
    let mut stmt = conn.prepare("SELECT wallet, name, note FROM recipients ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Recipient {
                wallet: parse_address(row.get::<_, String>(0)?),
                name: row.get(1)?,
                note: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Replace the recipient keyed by `old_wallet`. `updated` carries the final
/// wallet/name/note, which may differ from `old_wallet`'s current values
/// (spec §4.1 `update_recipient(old_wallet, {new_wallet?, new_name?, new_note?})`).
pub fn update_recipient(
    conn: &Connection,
    old_wallet: &str,
    updated: &Recipient,
) -> Result<(), ShardError> {
    let rows = conn
        .execute(
            "UPDATE recipients SET wallet = ?1, name = ?2, note = ?3 WHERE wallet = ?4",
            params![updated.wallet.as_str(), updated.name, updated.note, old_wallet],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                ShardError::Duplicate(format!("wallet {}", updated.wallet))
            } else {
                ShardError::Storage(e)
            }
        })?;
    if rows == 0 {
        return Err(ShardError::NotFound(format!("recipient with wallet {old_wallet}")));
    }
    Ok(())
}

pub fn delete_recipient(conn: &Connection, wallet: &str) -> Result<(), ShardError> {
    let rows = conn.execute("DELETE FROM recipients WHERE wallet = ?1", params![wallet])?;
    if rows == 0 {
        return Err(ShardError::NotFound(format!("recipient with wallet {wallet}")));
    }
    Ok(())
}

// --- schedules ----------------------------------------------------------

fn interval_to_str(interval: Interval) -> &'static str {
    match interval {
        Interval::Daily => "daily",
        Interval::Weekly => "weekly",
        Interval::Monthly => "monthly",
        Interval::Yearly => "yearly",
        Interval::Custom => "custom",
    }
}

fn interval_from_str(s: &str) -> Interval {
    match s {
        "daily" => Interval::Daily,
        "weekly" => Interval::Weekly,
        "monthly" => Interval::Monthly,
        "yearly" => Interval::Yearly,
        _ => Interval::Custom,
    }
}

fn parse_address(s: String) -> UserAddress {
    UserAddress::from_str(&s).expect("addresses are validated before being stored")
}

pub fn insert_schedule(conn: &Connection, schedule: &Schedule) -> Result<(), ShardError> {
    conn.execute(
        r#"
        INSERT INTO schedules (
            id, name, recipient, amount, currency, interval, interval_ms,
            start_date, time_of_day, times_total, times_remaining, note,
            next_run, created_at, active
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            schedule.id.to_string(),
            schedule.name,
            schedule.recipient.as_str(),
            schedule.amount.to_string(),
            schedule.currency,
            interval_to_str(schedule.interval),
            schedule.interval_ms,
            schedule.start_date.to_string(),
            schedule.time_of_day.map(|t| t.to_string()),
            schedule.times_total,
            schedule.times_remaining,
            schedule.note,
            schedule.next_run.to_rfc3339(),
            schedule.created_at.to_rfc3339(),
            schedule.active as i64,
        ],
    )?;
    Ok(())
}

fn schedule_from_row(row: &rusqlite::Row) -> rusqlite::Result<Schedule> {
    let id: String = row.get(0)?;
    let interval: String = row.get(5)?;
    let start_date: String = row.get(7)?;
    let time_of_day: Option<String> = row.get(8)?;
    let next_run: String = row.get(12)?;
    let created_at: String = row.get(13)?;

    Ok(Schedule {
        id: Uuid::parse_str(&id).expect("stored schedule ids are valid UUIDs"),
        name: row.get(1)?,
        recipient: parse_address(row.get(2)?),
        amount: rust_decimal::Decimal::from_str(&row.get::<_, String>(3)?)
            .expect("stored amounts are valid decimals"),
        currency: row.get(4)?,
        interval: interval_from_str(&interval),
        interval_ms: row.get(6)?,
        start_date: NaiveDate::from_str(&start_date).expect("stored dates are valid"),
        time_of_day: time_of_day.map(|t| NaiveTime::from_str(&t).expect("stored times are valid")),
        times_total: row.get(9)?,
        times_remaining: row.get(10)?,
        note: row.get(11)?,
        next_run: DateTime::parse_from_rfc3339(&next_run)
            .expect("stored timestamps are valid")
            .with_timezone(&Utc),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .expect("stored timestamps are valid")
            .with_timezone(&Utc),
        active: row.get::<_, i64>(14)? != 0,
    })
}

const SCHEDULE_COLUMNS: &str = "id, name, recipient, amount, currency, interval, interval_ms, \
     start_date, time_of_day, times_total, times_remaining, note, next_run, created_at, active";

pub fn get_schedule(conn: &Connection, id: ScheduleId) -> Result<Schedule, ShardError> {
    let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1");
    conn.query_row(&sql, params![id.to_string()], schedule_from_row)
        .optional()?
        .ok_or_else(|| ShardError::NotFound(format!("schedule {id}")))
}

pub fn list_schedules(conn: &Connection) -> Result<Vec<Schedule>, ShardError> {
    let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY created_at");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], schedule_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_schedule(conn: &Connection, schedule: &Schedule) -> Result<(), ShardError> {
    let rows = conn.execute(
        r#"
        UPDATE schedules SET
            name = ?2, recipient = ?3, amount = ?4, currency = ?5, interval = ?6,
            interval_ms = ?7, start_date = ?8, time_of_day = ?9, times_total = ?10,
            times_remaining = ?11, note = ?12, next_run = ?13, active = ?14
        WHERE id = ?1
        "#,
        params![
            schedule.id.to_string(),
            schedule.name,
            schedule.recipient.as_str(),
            schedule.amount.to_string(),
            schedule.currency,
            interval_to_str(schedule.interval),
            schedule.interval_ms,
            schedule.start_date.to_string(),
            schedule.time_of_day.map(|t| t.to_string()),
            schedule.times_total,
            schedule.times_remaining,
            schedule.note,
            schedule.next_run.to_rfc3339(),
            schedule.active as i64,
        ],
    )?;
    if rows == 0 {
        return Err(ShardError::NotFound(format!("schedule {}", schedule.id)));
    }
    Ok(())
}

pub fn delete_schedule(conn: &Connection, id: ScheduleId) -> Result<(), ShardError> {
    let rows = conn.execute(
        "DELETE FROM schedules WHERE id = ?1",
        params![id.to_string()],
    )?;
    if rows == 0 {
        return Err(ShardError::NotFound(format!("schedule {id}")));
    }
    Ok(())
}

// --- transactions ---------------------------------------------------------

fn tx_type_to_str(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::SendOnce => "send_once",
        TransactionType::Recurring => "recurring",
    }
}

fn tx_type_from_str(s: &str) -> TransactionType {
    match s {
        "recurring" => TransactionType::Recurring,
        _ => TransactionType::SendOnce,
    }
}

fn tx_status_to_str(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Completed => "completed",
        TransactionStatus::Failed => "failed",
    }
}

fn tx_status_from_str(s: &str) -> TransactionStatus {
    match s {
        "completed" => TransactionStatus::Completed,
        _ => TransactionStatus::Failed,
    }
}

pub fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<(), ShardError> {
    conn.execute(
        r#"
        INSERT INTO transactions (
            id, type, name, address, amount, currency, status, tx_hash,
            schedule_id, note, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            tx.id.to_string(),
            tx_type_to_str(tx.kind),
            tx.name,
            tx.address.as_str(),
            tx.amount.to_string(),
            tx.currency,
            tx_status_to_str(tx.status),
            tx.tx_hash,
            tx.schedule_id.map(|id| id.to_string()),
            tx.note,
            tx.timestamp.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_transactions(conn: &Connection) -> Result<Vec<Transaction>, ShardError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, type, name, address, amount, currency, status, tx_hash,
               schedule_id, note, timestamp
        FROM transactions
        ORDER BY timestamp DESC
        "#,
    )?;
    let rows = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let kind: String = row.get(1)?;
            let status: String = row.get(6)?;
            let schedule_id: Option<String> = row.get(8)?;
            let timestamp: String = row.get(10)?;

            Ok(Transaction {
                id: Uuid::parse_str(&id).expect("stored transaction ids are valid UUIDs"),
                kind: tx_type_from_str(&kind),
                name: row.get(2)?,
                address: parse_address(row.get(3)?),
                amount: rust_decimal::Decimal::from_str(&row.get::<_, String>(4)?)
                    .expect("stored amounts are valid decimals"),
                currency: row.get(5)?,
                status: tx_status_from_str(&status),
                tx_hash: row.get(7)?,
                schedule_id: schedule_id
                    .map(|s| Uuid::parse_str(&s).expect("stored schedule ids are valid UUIDs")),
                note: row.get(9)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp)
                    .expect("stored timestamps are valid")
                    .with_timezone(&Utc),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// --- auth state -------------------------------------------------------

pub fn get_auth_state(conn: &Connection) -> Result<AuthState, ShardError> {
    let state = conn
        .query_row(
            "SELECT nonce, updated_at FROM auth_state WHERE id = 1",
            [],
            |row| {
                let updated_at: Option<String> = row.get(1)?;
                Ok(AuthState {
                    nonce: row.get(0)?,
                    updated_at: updated_at.map(|s| {
                        DateTime::parse_from_rfc3339(&s)
                            .expect("stored timestamps are valid")
                            .with_timezone(&Utc)
                    }),
                })
            },
        )
        .optional()?
        .unwrap_or_default();
    Ok(state)
}

pub fn set_auth_state(conn: &Connection, state: &AuthState) -> Result<(), ShardError> {
    conn.execute(
        r#"
        INSERT INTO auth_state (id, nonce, updated_at) VALUES (1, ?1, ?2)
        ON CONFLICT(id) DO UPDATE SET nonce = excluded.nonce, updated_at = excluded.updated_at
        "#,
        params![state.nonce, state.updated_at.map(|t| t.to_rfc3339())],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicepay_types::Schedule;

    fn open_mem() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn recipient(name: &str, wallet: &str) -> Recipient {
        Recipient {
            name: name.to_string(),
            wallet: wallet.parse().unwrap(),
            note: None,
        }
    }

    #[test]
    fn recipient_roundtrip() {
        let conn = open_mem();
        insert_recipient(
            &conn,
            &recipient("alice", "0x1111111111111111111111111111111111111111"),
        )
        .unwrap();
        let all = list_recipients(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "alice");
    }

    /// P7: adding a recipient with an already-present wallet is rejected,
    /// even under a different display name.
    #[test]
    fn duplicate_wallet_is_rejected_regardless_of_name() {
        let conn = open_mem();
        insert_recipient(
            &conn,
            &recipient("alice", "0x1111111111111111111111111111111111111111"),
        )
        .unwrap();
        let err = insert_recipient(
            &conn,
            &recipient("alice-2", "0x1111111111111111111111111111111111111111"),
        )
        .unwrap_err();
        assert!(matches!(err, ShardError::Duplicate(_)));
    }

    #[test]
    fn delete_missing_recipient_is_not_found() {
        let conn = open_mem();
        let err = delete_recipient(&conn, "0xdeaddeaddeaddeaddeaddeaddeaddeaddeaddead").unwrap_err();
        assert!(matches!(err, ShardError::NotFound(_)));
    }

    fn sample_schedule() -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            name: Some("rent".to_string()),
            recipient: "0x2222222222222222222222222222222222222222".parse().unwrap(),
            amount: rust_decimal::Decimal::new(1500, 2),
            currency: "USDC".to_string(),
            interval: Interval::Monthly,
            interval_ms: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            time_of_day: None,
            times_total: Some(12),
            times_remaining: Some(12),
            note: None,
            next_run: Schedule::initial_next_run(
                NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                None,
            ),
            created_at: Utc::now(),
            active: true,
        }
    }

    #[test]
    fn schedule_roundtrip_preserves_decimal_and_interval() {
        let conn = open_mem();
        let schedule = sample_schedule();
        insert_schedule(&conn, &schedule).unwrap();
        let fetched = get_schedule(&conn, schedule.id).unwrap();
        assert_eq!(fetched.amount, schedule.amount);
        assert_eq!(fetched.interval, Interval::Monthly);
        assert_eq!(fetched.next_run, schedule.next_run);
    }

    #[test]
    fn update_schedule_persists_new_times_remaining() {
        let conn = open_mem();
        let mut schedule = sample_schedule();
        insert_schedule(&conn, &schedule).unwrap();
        schedule.times_remaining = Some(11);
        update_schedule(&conn, &schedule).unwrap();
        let fetched = get_schedule(&conn, schedule.id).unwrap();
        assert_eq!(fetched.times_remaining, Some(11));
    }

    #[test]
    fn auth_state_roundtrip() {
        let conn = open_mem();
        let state = AuthState {
            nonce: Some("abc123".to_string()),
            updated_at: Some(Utc::now()),
        };
        set_auth_state(&conn, &state).unwrap();
        let fetched = get_auth_state(&conn).unwrap();
        assert_eq!(fetched.nonce, state.nonce);
    }
}
