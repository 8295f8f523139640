//! Recurring payment schedules and interval advancement.
//!
//! Interval math follows spec §4.3: daily/weekly add fixed durations,
//! monthly/yearly walk calendar months/years and clamp to the resulting
//! month's length, and `nextRun` is always strictly greater than its
//! previous value (I2).

use crate::address::UserAddress;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ScheduleId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: Option<String>,
    pub recipient: UserAddress,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    pub interval: Interval,
    pub interval_ms: Option<i64>,
    pub start_date: NaiveDate,
    pub time_of_day: Option<NaiveTime>,
    pub times_total: Option<u32>,
    pub times_remaining: Option<u32>,
    pub note: Option<String>,
    pub next_run: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl Schedule {
    /// Compute the initial `nextRun` per spec §4.3 step 2:
    /// `combine(start_date, time_of_day ?? 00:00:00)` interpreted in UTC.
    pub fn initial_next_run(start_date: NaiveDate, time_of_day: Option<NaiveTime>) -> DateTime<Utc> {
        let time = time_of_day.unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        Utc.from_utc_datetime(&start_date.and_time(time))
    }

    /// Whether this schedule still has fires remaining.
    pub fn has_remaining_fires(&self) -> bool {
        match self.times_remaining {
            Some(remaining) => remaining > 0,
            None => true,
        }
    }
}

/// Advance `current` by one occurrence of `interval`. Always returns a
/// strictly later instant than `current` (I2).
pub fn advance(current: DateTime<Utc>, interval: Interval, interval_ms: Option<i64>) -> DateTime<Utc> {
    match interval {
        Interval::Custom => {
            let ms = interval_ms.filter(|ms| *ms > 0).unwrap_or(86_400_000);
            current + Duration::milliseconds(ms)
        }
        Interval::Daily => current + Duration::days(1),
        Interval::Weekly => current + Duration::weeks(1),
        Interval::Monthly => add_calendar_months(current, 1),
        Interval::Yearly => add_calendar_months(current, 12),
    }
}

/// Add `months` calendar months to `dt`, clamping the day-of-month to the
/// resulting month's length (spec §8 scenario 2: Jan 31 + 1 month = Feb 28).
fn add_calendar_months(dt: DateTime<Utc>, months: i32) -> DateTime<Utc> {
    let total_month0 = (dt.month0() as i32) + months;
    let year = dt.year() + total_month0.div_euclid(12);
    let month0 = total_month0.rem_euclid(12);
    let month = (month0 + 1) as u32;

    let day = dt.day();
    let clamped_day = day.min(days_in_month(year, month));

    let naive_date = NaiveDate::from_ymd_opt(year, month, clamped_day)
        .expect("clamped day is always valid for its month");
    Utc.from_utc_datetime(&naive_date.and_time(dt.time()))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap();
    let first_of_this = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    (first_of_next - first_of_this).num_days() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    #[test]
    fn daily_advancement_is_one_day() {
        let next = advance(dt(2025, 1, 1, 9, 0), Interval::Daily, None);
        assert_eq!(next, dt(2025, 1, 2, 9, 0));
    }

    #[test]
    fn monthly_clamps_end_of_month() {
        // Scenario 2: start_date=2025-01-31, interval=monthly.
        let first = dt(2025, 1, 31, 0, 0);
        let after_first = advance(first, Interval::Monthly, None);
        assert_eq!(after_first, dt(2025, 2, 28, 0, 0));

        let after_second = advance(after_first, Interval::Monthly, None);
        assert_eq!(after_second, dt(2025, 3, 31, 0, 0));
    }

    #[test]
    fn custom_interval_adds_milliseconds() {
        let next = advance(dt(2025, 1, 1, 0, 0), Interval::Custom, Some(3_600_000));
        assert_eq!(next, dt(2025, 1, 1, 1, 0));
    }

    #[test]
    fn initial_next_run_defaults_to_midnight() {
        let next = Schedule::initial_next_run(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), None);
        assert_eq!(next, dt(2025, 1, 1, 0, 0));
    }

    #[test]
    fn advance_is_always_strictly_greater() {
        for interval in [Interval::Daily, Interval::Weekly, Interval::Monthly, Interval::Yearly] {
            let current = dt(2025, 2, 28, 23, 59);
            assert!(advance(current, interval, None) > current);
        }
    }
}
