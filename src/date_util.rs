//! Calendar helpers. Every date here is a UTC calendar date.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};

use crate::error::{Error, Result};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Get the first day of the month containing `d`.
pub fn first_day_of_month(d: NaiveDate) -> NaiveDate {
    d - Duration::days(d.day0() as i64)
}

/// Get the last day of the month containing `d`.
pub fn last_day_of_month(d: NaiveDate) -> NaiveDate {
    first_day_of_month(d)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Get the Sunday that starts the week containing `d`.
pub fn start_of_week(d: NaiveDate) -> NaiveDate {
    d - Duration::days(d.weekday().num_days_from_sunday() as i64)
}

/// Whole days between two instants, rounded half away from zero.
///
/// Negative when `end` precedes `start`.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).round() as i64
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::TimestampParse(format!("expected RFC 3339 or YYYY-MM-DD: {s}")))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::TimestampParse(format!("invalid date: {s}")))?;
    Ok(Utc.from_utc_datetime(&midnight))
}
