use crate::address::UserAddress;
use crate::schedule::Interval;
use chrono::NaiveDate;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    SendOnce,
    RecurringPayment,
}

/// Candidate intent returned by the opaque NL parser (spec §4.6). `address`
/// is absent when the caller only supplied a recipient `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIntent {
    pub intent: IntentKind,
    pub name: Option<String>,
    pub address: Option<UserAddress>,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    pub interval: Option<Interval>,
    pub start_date: Option<NaiveDate>,
    pub time_of_day: Option<NaiveTime>,
    pub times: Option<u32>,
    pub note: Option<String>,
}

/// The canonical, fully-resolved intent returned by the Intent Resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIntent {
    pub intent: IntentKind,
    pub address: UserAddress,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    pub interval: Option<Interval>,
    pub start_date: NaiveDate,
    pub time_of_day: Option<NaiveTime>,
    pub times: Option<u32>,
    pub note: Option<String>,
}
