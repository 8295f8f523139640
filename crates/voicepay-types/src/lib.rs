//! Shared data model for the VoicePay recurring-payment scheduler.
//!
//! Every component (control plane, dispatcher, executor bridge) builds on
//! these types rather than redefining the wire shapes independently.

pub mod address;
pub mod auth;
pub mod error;
pub mod index_entry;
pub mod intent;
pub mod recipient;
pub mod schedule;
pub mod transaction;

pub use address::UserAddress;
pub use auth::AuthState;
pub use error::VoicePayError;
pub use index_entry::IndexEntry;
pub use intent::{IntentKind, ParsedIntent, ResolvedIntent};
pub use recipient::{resolve_by_name, MatchKind, Recipient, ResolveOutcome};
pub use schedule::{advance, Interval, Schedule, ScheduleId};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
