//! Logical-day arithmetic.
//!
//! A logical day starts at 03:00 local time, so activity logged shortly after
//! midnight still counts toward the previous date.

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};

/// Hour at which a new logical day begins.
pub const DAY_START_HOUR: u32 = 3;

/// Returns the logical day that `now` belongs to.
pub fn logical_day(now: NaiveDateTime) -> NaiveDate {
    let date = now.date();
    if now.hour() < DAY_START_HOUR {
        date.checked_sub_days(Days::new(1)).unwrap_or(date)
    } else {
        date
    }
}

/// Formats a day as the `YYYY-MM-DD` partition key.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parses a `YYYY-MM-DD` key back into a date.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_before_three_belongs_to_yesterday() {
        assert_eq!(day_key(logical_day(at(2024, 3, 2, 2, 59))), "2024-03-01");
    }

    #[test]
    fn test_three_oclock_starts_new_day() {
        assert_eq!(day_key(logical_day(at(2024, 3, 2, 3, 0))), "2024-03-02");
    }

    #[test]
    fn test_midnight_crosses_month_and_year() {
        assert_eq!(day_key(logical_day(at(2024, 3, 1, 0, 0))), "2024-02-29");
        assert_eq!(day_key(logical_day(at(2025, 1, 1, 1, 30))), "2024-12-31");
    }

    #[test]
    fn test_late_evening_is_same_day() {
        assert_eq!(day_key(logical_day(at(2024, 3, 2, 23, 59))), "2024-03-02");
    }

    #[test]
    fn test_parse_day_key() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_day_key("2024-03-01"), Some(day));
        assert_eq!(parse_day_key("03/01/2024"), None);
        assert_eq!(parse_day_key(""), None);
    }
}
