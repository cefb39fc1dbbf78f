// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar-day comparisons.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as RFC3339.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// The fixed offset used for all calendar-day comparisons.
///
/// Out-of-range offsets fall back to UTC.
pub fn site_offset(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// Calendar date of `now` in the site offset.
pub fn today_at(now: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    now.with_timezone(&site_offset(offset_minutes)).date_naive()
}

/// Parse a stored calendar date (`YYYY-MM-DD`, optionally followed by a time part).
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_calendar_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_calendar_date("2024-03-09"), expected);
        assert_eq!(parse_calendar_date("2024-03-09T23:59"), expected);
        assert_eq!(parse_calendar_date(" 2024-03-09 "), expected);
        assert_eq!(parse_calendar_date("03/09/2024"), None);
        assert_eq!(parse_calendar_date(""), None);
    }

    #[test]
    fn test_today_respects_offset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();
        assert_eq!(today_at(now, 0), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        // +09:00 is already the next day
        assert_eq!(today_at(now, 540), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }
}
