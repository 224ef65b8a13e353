//! Calendar-date helpers for API date strings.
//!
//! API dates are facility-local `YYYY-MM-DD` strings. They are read as
//! wall-clock noon so the weekday never shifts across a timezone boundary.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use thiserror::Error;

/// Time of day appended to a bare date before it is interpreted.
pub const REFERENCE_TIME: &str = "T12:00:00";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid calendar date '{input}'")]
pub struct DateError {
    pub input: String,
}

/// Parse an API date string (`YYYY-MM-DD`) at the noon reference time.
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, DateError> {
    let with_time = format!("{}{}", input.trim(), REFERENCE_TIME);
    NaiveDateTime::parse_from_str(&with_time, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .map_err(|_| DateError {
            input: input.to_string(),
        })
}

pub fn weekday_of(input: &str) -> Result<Weekday, DateError> {
    parse_calendar_date(input).map(|date| date.weekday())
}

/// Compact label, e.g. "Nov 7".
pub fn short_label(input: &str) -> Result<String, DateError> {
    parse_calendar_date(input).map(|date| date.format("%b %-d").to_string())
}

/// Full label, e.g. "Saturday, November 7, 2026".
pub fn long_label(input: &str) -> Result<String, DateError> {
    parse_calendar_date(input).map(|date| date.format("%A, %B %-d, %Y").to_string())
}

/// Full English weekday name.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    const DAY_NAMES: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    DAY_NAMES[weekday.num_days_from_monday() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calendar_date_valid() {
        let date = parse_calendar_date("2026-11-07").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 11, 7).unwrap());
    }

    #[test]
    fn test_parse_calendar_date_trims_whitespace() {
        assert!(parse_calendar_date(" 2026-11-07 ").is_ok());
    }

    #[test]
    fn test_parse_calendar_date_rejects_garbage() {
        let err = parse_calendar_date("next saturday").unwrap_err();
        assert_eq!(err.input, "next saturday");
        assert!(err.to_string().contains("next saturday"));
    }

    #[test]
    fn test_parse_calendar_date_rejects_impossible_day() {
        assert!(parse_calendar_date("2026-02-30").is_err());
    }

    #[test]
    fn test_parse_calendar_date_rejects_datetime_input() {
        // Already carries a time; appending the reference time makes it invalid
        assert!(parse_calendar_date("2026-11-07T00:00:00").is_err());
    }

    #[test]
    fn test_weekday_of_saturday() {
        assert_eq!(weekday_of("2026-11-07").unwrap(), Weekday::Sat);
        assert_eq!(weekday_of("2027-01-02").unwrap(), Weekday::Sat);
    }

    #[test]
    fn test_weekday_of_other_days() {
        assert_eq!(weekday_of("2026-11-08").unwrap(), Weekday::Sun);
        assert_eq!(weekday_of("2026-11-06").unwrap(), Weekday::Fri);
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label("2026-11-07").unwrap(), "Nov 7");
        assert_eq!(short_label("2026-12-19").unwrap(), "Dec 19");
    }

    #[test]
    fn test_long_label() {
        assert_eq!(
            long_label("2026-11-07").unwrap(),
            "Saturday, November 7, 2026"
        );
    }

    #[test]
    fn test_weekday_name_all_days() {
        assert_eq!(weekday_name(Weekday::Mon), "Monday");
        assert_eq!(weekday_name(Weekday::Sat), "Saturday");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }
}
