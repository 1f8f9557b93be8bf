use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::date_util::{first_day_of_month, last_day_of_month, start_of_week};
use crate::error::{Error, Result};

/// A calendar window relative to "today", used to bucket upcoming due dates.
///
/// Windows overlap: a date in `Today` is also in `ThisWeek` and `ThisMonth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueWindow {
    Today,
    ThisWeek,
    ThisMonth,
}

impl DueWindow {
    pub const ALL: [DueWindow; 3] = [DueWindow::Today, DueWindow::ThisWeek, DueWindow::ThisMonth];

    /// Parse a window name.
    ///
    /// Supported formats:
    /// - `today` / `day`
    /// - `week` / `this-week` / `wtd`
    /// - `month` / `this-month` / `mtd`
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "today" | "day" => Ok(DueWindow::Today),
            "week" | "this-week" | "wtd" => Ok(DueWindow::ThisWeek),
            "month" | "this-month" | "mtd" => Ok(DueWindow::ThisMonth),
            other => Err(Error::WindowParse(format!("unrecognized window: {other}"))),
        }
    }

    pub fn to_key(&self) -> &'static str {
        match self {
            DueWindow::Today => "today",
            DueWindow::ThisWeek => "this-week",
            DueWindow::ThisMonth => "this-month",
        }
    }

    /// Get the date range (inclusive start, inclusive end) for this window.
    ///
    /// The week runs from the Sunday on or before `today` through the
    /// following Sunday.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            DueWindow::Today => (today, today),
            DueWindow::ThisWeek => {
                let start = start_of_week(today);
                (start, start + Duration::days(7))
            }
            DueWindow::ThisMonth => (first_day_of_month(today), last_day_of_month(today)),
        }
    }

    pub fn contains(&self, today: NaiveDate, date: NaiveDate) -> bool {
        let (start, end) = self.date_range(today);
        date >= start && date <= end
    }
}

impl std::fmt::Display for DueWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(DueWindow::parse("today").unwrap(), DueWindow::Today);
        assert_eq!(DueWindow::parse("Week").unwrap(), DueWindow::ThisWeek);
        assert_eq!(DueWindow::parse("this_week").unwrap(), DueWindow::ThisWeek);
        assert_eq!(DueWindow::parse("mtd").unwrap(), DueWindow::ThisMonth);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            DueWindow::parse("fortnight"),
            Err(Error::WindowParse(_))
        ));
    }

    #[test]
    fn test_to_key_round_trips() {
        for window in DueWindow::ALL {
            assert_eq!(DueWindow::parse(window.to_key()).unwrap(), window);
        }
    }

    #[test]
    fn test_date_range_week_is_sunday_to_sunday() {
        // Wednesday
        let (s, e) = DueWindow::ThisWeek.date_range(date(2025, 11, 12));
        assert_eq!(s, date(2025, 11, 9));
        assert_eq!(e, date(2025, 11, 16));
    }

    #[test]
    fn test_date_range_month() {
        let (s, e) = DueWindow::ThisMonth.date_range(date(2025, 2, 10));
        assert_eq!(s, date(2025, 2, 1));
        assert_eq!(e, date(2025, 2, 28));
    }

    #[test]
    fn test_week_can_straddle_months() {
        // Saturday 2025-11-01; week started Sunday 2025-10-26
        let today = date(2025, 11, 1);
        assert!(DueWindow::ThisWeek.contains(today, date(2025, 10, 27)));
        assert!(!DueWindow::ThisMonth.contains(today, date(2025, 10, 27)));
    }

    #[test]
    fn test_contains_today() {
        let today = date(2025, 11, 12);
        assert!(DueWindow::Today.contains(today, today));
        assert!(!DueWindow::Today.contains(today, date(2025, 11, 13)));
    }
}
