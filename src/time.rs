//! Calendar helpers shared by the planning and event services.
//!
//! Calendar dates are naive (a `YYYY-MM-DD` literal means midnight UTC of that
//! day) and instants are always normalized to UTC.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::{AppError, AppResult};
use crate::i18n;

/// Parse a strict `YYYY-MM-DD` literal.
pub fn parse_calendar_date(s: &str) -> AppResult<NaiveDate> {
    let invalid =
        || AppError::InvalidInput(i18n::t_with("validation.invalid_date", &[("value", s)]));

    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())
}

/// Parse an RFC 3339 date-time with an explicit offset and normalize it to UTC.
pub fn parse_instant(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            AppError::InvalidInput(i18n::t_with("validation.invalid_datetime", &[("value", s)]))
        })
}

pub fn format_calendar_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Wall-clock `HH:MM` of an instant as seen at `offset`.
pub fn format_time_hhmm(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant.with_timezone(&offset).format("%H:%M").to_string()
}

/// Fixed offset east of UTC, in minutes. Bounded to ±18h.
pub fn offset_from_minutes(minutes: i32) -> AppResult<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .filter(|_| minutes.abs() <= 18 * 60)
        .ok_or_else(|| {
            AppError::InvalidInput(i18n::t_with(
                "validation.invalid_offset",
                &[("value", &minutes.to_string())],
            ))
        })
}

/// UTC calendar day an instant falls on.
pub fn utc_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Sunday of the Sunday..Saturday week containing `d`.
pub fn start_of_week(d: NaiveDate) -> NaiveDate {
    d - Duration::days(i64::from(d.weekday().num_days_from_sunday()))
}

/// Saturday of the Sunday..Saturday week containing `d`.
pub fn end_of_week(d: NaiveDate) -> NaiveDate {
    start_of_week(d) + Duration::days(6)
}

/// Convert a local `HH:MM` on `day` at a fixed UTC offset into an instant.
pub fn instant_from_day_and_time(
    day: NaiveDate,
    hhmm: &str,
    offset: FixedOffset,
) -> AppResult<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(hhmm, "%H:%M").map_err(|_| {
        AppError::InvalidInput(i18n::t_with("validation.invalid_time", &[("value", hhmm)]))
    })?;

    offset
        .from_local_datetime(&day.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::InvalidInput(i18n::t_with("validation.invalid_time", &[("value", hhmm)]))
        })
}

/// Inclusive day-by-day walk from `start` to `end`.
///
/// Clone the value to iterate the same range again.
#[derive(Debug, Clone)]
pub struct WeekDays {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for WeekDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.filter(|d| *d <= self.end)?;
        self.next = current.succ_opt();
        Some(current)
    }
}

/// Every calendar day in `[start, end]`, ascending. Empty when `end < start`.
pub fn week_days(start: NaiveDate, end: NaiveDate) -> WeekDays {
    WeekDays {
        next: Some(start),
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parses_strict_calendar_dates() {
        assert_eq!(parse_calendar_date("2026-02-09").unwrap(), date("2026-02-09"));
        assert!(parse_calendar_date("2026-2-9").is_err());
        assert!(parse_calendar_date("2026-02-30").is_err());
        assert!(parse_calendar_date("2026/02/09").is_err());
        assert!(parse_calendar_date("2026-02-09T00:00:00Z").is_err());
        assert!(parse_calendar_date("").is_err());
    }

    #[test]
    fn calendar_date_round_trips() {
        let d = parse_calendar_date("2026-02-15").unwrap();
        assert_eq!(format_calendar_date(d), "2026-02-15");
    }

    #[test]
    fn instants_are_normalized_to_utc() {
        let a = parse_instant("2026-02-09T21:00:00Z").unwrap();
        let b = parse_instant("2026-02-09T22:00:00+01:00").unwrap();
        assert_eq!(a, b);
        assert!(matches!(
            parse_instant("not a date"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(parse_instant("2026-02-09T21:00:00").is_err());
    }

    #[test]
    fn week_days_is_inclusive_and_restartable() {
        let days = week_days(date("2026-02-09"), date("2026-02-15"));
        let first: Vec<_> = days.clone().collect();
        let second: Vec<_> = days.collect();
        assert_eq!(first.len(), 7);
        assert_eq!(first.first(), Some(&date("2026-02-09")));
        assert_eq!(first.last(), Some(&date("2026-02-15")));
        assert_eq!(first, second);
    }

    #[test]
    fn week_days_edges() {
        assert_eq!(week_days(date("2026-02-09"), date("2026-02-09")).count(), 1);
        assert_eq!(week_days(date("2026-02-10"), date("2026-02-09")).count(), 0);
        let across_month: Vec<_> = week_days(date("2026-02-27"), date("2026-03-02")).collect();
        assert_eq!(
            across_month,
            vec![
                date("2026-02-27"),
                date("2026-02-28"),
                date("2026-03-01"),
                date("2026-03-02")
            ]
        );
    }

    #[test]
    fn week_window_is_sunday_to_saturday() {
        // 2026-02-11 is a Wednesday
        let d = date("2026-02-11");
        assert_eq!(start_of_week(d), date("2026-02-08"));
        assert_eq!(end_of_week(d), date("2026-02-14"));
        assert_eq!(start_of_week(d).weekday(), Weekday::Sun);
        assert_eq!(end_of_week(d).weekday(), Weekday::Sat);

        let sunday = date("2026-02-08");
        assert_eq!(start_of_week(sunday), sunday);
        let saturday = date("2026-02-14");
        assert_eq!(end_of_week(saturday), saturday);
    }

    #[test]
    fn local_time_converts_to_instant() {
        let paris = FixedOffset::east_opt(3600).unwrap();
        let instant = instant_from_day_and_time(date("2026-02-09"), "21:30", paris).unwrap();
        assert_eq!(instant, parse_instant("2026-02-09T20:30:00Z").unwrap());
        assert_eq!(format_time_hhmm(instant, paris), "21:30");
        assert!(instant_from_day_and_time(date("2026-02-09"), "25:00", paris).is_err());
    }

    #[test]
    fn offsets_in_minutes() {
        assert_eq!(offset_from_minutes(60).unwrap().local_minus_utc(), 3600);
        assert_eq!(offset_from_minutes(-330).unwrap().local_minus_utc(), -19800);
        assert!(offset_from_minutes(24 * 60).is_err());
    }

    #[test]
    fn utc_day_ignores_local_offset() {
        let late = parse_instant("2026-02-09T23:30:00-02:00").unwrap();
        assert_eq!(utc_day(late), date("2026-02-10"));
    }
}
