//! Global due-schedule projection (C2): every active schedule's
//! `(schedule_id, next_run, ...)` in one place so the dispatcher never has
//! to scan every shard on every tick.

pub mod error;
pub mod persistent;
pub mod store;

pub use error::IndexError;
pub use persistent::SqliteScheduleIndex;
pub use store::{ScheduleIndex, ScheduleIndexStore};
