//! Range invariants for plannings and events.
//!
//! Planning ranges are closed calendar-day intervals: two plannings touching on
//! a shared boundary day overlap. Event ranges are half-open instant intervals:
//! back-to-back events do not.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use sqlx::{Executor, Sqlite};
use validator::ValidateEmail;

use crate::db::{Event, PlanningRepository};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::time::{format_calendar_date, utc_day};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start`. A single-day range is valid.
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if end < start {
            return Err(AppError::InvalidRange(i18n::t_with(
                "range.planning",
                &[
                    ("start", &format_calendar_date(start)),
                    ("end", &format_calendar_date(end)),
                ],
            )));
        }
        Ok(Self { start, end })
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, requiring `end > start` strictly.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if end <= start {
            return Err(AppError::InvalidRange(i18n::t("range.event")));
        }
        Ok(Self { start, end })
    }

    pub fn of(event: &Event) -> Self {
        Self {
            start: event.starts_at,
            end: event.ends_at,
        }
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Fail with `Conflict` if any planning of `user_id` other than
/// `exclude_planning_id` intersects `range`.
///
/// Must run on the same transaction as the write that follows it.
pub async fn assert_no_planning_overlap<'c, E>(
    executor: E,
    user_id: &str,
    range: DateRange,
    exclude_planning_id: Option<&str>,
) -> AppResult<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    let overlap = PlanningRepository::find_first_overlapping(
        executor,
        user_id,
        range.start,
        range.end,
        exclude_planning_id,
    )
    .await?;

    match overlap {
        None => Ok(()),
        Some(existing) => {
            debug_assert!(range.overlaps(&DateRange {
                start: existing.week_start,
                end: existing.week_end,
            }));
            let start = format_calendar_date(existing.week_start);
            let end = format_calendar_date(existing.week_end);
            tracing::debug!(
                "Planning range {}..{} for user {} overlaps planning {}",
                range.start,
                range.end,
                user_id,
                existing.id
            );
            Err(AppError::Conflict {
                message: i18n::t_with(
                    "conflict.planning_overlap",
                    &[("name", &existing.name), ("start", &start), ("end", &end)],
                ),
                details: Some(json!({
                    "planningId": existing.id,
                    "name": existing.name,
                    "weekStart": start,
                    "weekEnd": end,
                })),
            })
        }
    }
}

/// First event in `existing` (other than `exclude_id`) intersecting `candidate`.
pub fn find_event_conflict<'a>(
    candidate: &TimeRange,
    existing: &'a [Event],
    exclude_id: Option<&str>,
) -> Option<&'a Event> {
    existing
        .iter()
        .filter(|e| Some(e.id.as_str()) != exclude_id)
        .find(|e| candidate.overlaps(&TimeRange::of(e)))
}

/// Same as `find_event_conflict`, limited to events starting on `day` (UTC).
pub fn find_same_day_conflict<'a>(
    day: NaiveDate,
    candidate: &TimeRange,
    existing: &'a [Event],
    exclude_id: Option<&str>,
) -> Option<&'a Event> {
    existing
        .iter()
        .filter(|e| Some(e.id.as_str()) != exclude_id)
        .filter(|e| utc_day(e.starts_at) == day)
        .find(|e| candidate.overlaps(&TimeRange::of(e)))
}

/// Fail with `Conflict` naming the blocking event if `candidate` intersects
/// another event of the same planning.
pub fn assert_no_event_overlap(
    candidate: &TimeRange,
    existing: &[Event],
    exclude_id: Option<&str>,
) -> AppResult<()> {
    match find_event_conflict(candidate, existing, exclude_id) {
        None => Ok(()),
        Some(blocking) => {
            let start = blocking.starts_at.to_rfc3339();
            let end = blocking.ends_at.to_rfc3339();
            Err(AppError::Conflict {
                message: i18n::t_with(
                    "conflict.event_overlap",
                    &[("start", &start), ("end", &end)],
                ),
                details: Some(json!({
                    "eventId": blocking.id,
                    "gameName": blocking.game_name,
                    "startsAt": start,
                    "endsAt": end,
                })),
            })
        }
    }
}

/// Trimmed non-empty text, or `InvalidInput` with the message under `key`.
pub fn require_text(value: &str, key: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(i18n::t(key)));
    }
    Ok(trimmed.to_string())
}

/// Optional free text: blank collapses to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Absolute http(s) URL check for user-supplied links.
pub fn validate_url(field: &str, value: &str) -> AppResult<String> {
    let invalid =
        || AppError::InvalidInput(i18n::t_with("validation.invalid_url", &[("field", field)]));
    let parsed = url::Url::parse(value.trim()).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(value.trim().to_string()),
        _ => Err(invalid()),
    }
}

/// Validate an optional URL, treating blank as absent.
pub fn optional_url(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    optional_text(value)
        .map(|v| validate_url(field, &v))
        .transpose()
}

/// Lowercased, trimmed email, checked with `validator`'s address rules.
pub fn normalize_email(value: &str) -> AppResult<String> {
    let email = value.trim().to_lowercase();
    if !email.validate_email() {
        return Err(AppError::InvalidInput(i18n::t("validation.invalid_email")));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{parse_calendar_date, parse_instant};

    fn d(s: &str) -> NaiveDate {
        parse_calendar_date(s).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        parse_instant(s).unwrap()
    }

    fn event(id: &str, start: &str, end: &str) -> Event {
        Event {
            id: id.to_string(),
            planning_id: "p".to_string(),
            title: None,
            game_name: "Celeste".to_string(),
            game_image_url: None,
            starts_at: at(start),
            ends_at: at(end),
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn date_range_rejects_reversed_bounds() {
        assert!(DateRange::new(d("2026-02-09"), d("2026-02-09")).is_ok());
        assert!(matches!(
            DateRange::new(d("2026-02-10"), d("2026-02-09")),
            Err(AppError::InvalidRange(_))
        ));
    }

    #[test]
    fn date_ranges_overlap_on_closed_intervals() {
        let a = DateRange::new(d("2026-02-09"), d("2026-02-15")).unwrap();
        let touching = DateRange::new(d("2026-02-15"), d("2026-02-20")).unwrap();
        let after = DateRange::new(d("2026-02-16"), d("2026-02-20")).unwrap();
        let inside = DateRange::new(d("2026-02-11"), d("2026-02-11")).unwrap();
        let before = DateRange::new(d("2026-02-01"), d("2026-02-08")).unwrap();

        assert!(a.overlaps(&touching));
        assert!(touching.overlaps(&a));
        assert!(a.overlaps(&inside));
        assert!(!a.overlaps(&after));
        assert!(!a.overlaps(&before));
    }

    #[test]
    fn date_overlap_matches_interval_formula() {
        let days: Vec<NaiveDate> =
            crate::time::week_days(d("2026-02-01"), d("2026-02-06")).collect();
        for &s1 in &days {
            for &e1 in days.iter().filter(|e| **e >= s1) {
                for &s2 in &days {
                    for &e2 in days.iter().filter(|e| **e >= s2) {
                        let r1 = DateRange::new(s1, e1).unwrap();
                        let r2 = DateRange::new(s2, e2).unwrap();
                        assert_eq!(r1.overlaps(&r2), s1 <= e2 && e1 >= s2);
                    }
                }
            }
        }
    }

    #[test]
    fn time_range_requires_strictly_later_end() {
        let err = TimeRange::new(at("2026-02-09T21:00:00Z"), at("2026-02-09T20:00:00Z"));
        assert!(matches!(err, Err(AppError::InvalidRange(_))));
        let zero = TimeRange::new(at("2026-02-09T21:00:00Z"), at("2026-02-09T21:00:00Z"));
        assert!(matches!(zero, Err(AppError::InvalidRange(_))));
    }

    #[test]
    fn back_to_back_events_do_not_conflict() {
        let existing = vec![event("e1", "2026-02-09T18:00:00Z", "2026-02-09T20:00:00Z")];
        let next = TimeRange::new(at("2026-02-09T20:00:00Z"), at("2026-02-09T22:00:00Z")).unwrap();
        assert!(find_event_conflict(&next, &existing, None).is_none());

        let overlapping =
            TimeRange::new(at("2026-02-09T19:59:00Z"), at("2026-02-09T22:00:00Z")).unwrap();
        assert_eq!(
            find_event_conflict(&overlapping, &existing, None).map(|e| e.id.as_str()),
            Some("e1")
        );
    }

    #[test]
    fn excluded_event_is_ignored() {
        let existing = vec![event("e1", "2026-02-09T18:00:00Z", "2026-02-09T20:00:00Z")];
        let same = TimeRange::of(&existing[0]);
        assert!(assert_no_event_overlap(&same, &existing, Some("e1")).is_ok());

        let err = assert_no_event_overlap(&same, &existing, None).unwrap_err();
        match err {
            AppError::Conflict { details, .. } => {
                assert_eq!(details.unwrap()["eventId"], "e1");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn same_day_check_only_looks_at_that_day() {
        let existing = vec![
            event("late", "2026-02-09T22:00:00Z", "2026-02-10T01:00:00Z"),
            event("next", "2026-02-10T10:00:00Z", "2026-02-10T12:00:00Z"),
        ];
        let early_tenth =
            TimeRange::new(at("2026-02-10T00:00:00Z"), at("2026-02-10T00:30:00Z")).unwrap();

        // Advisory check keyed on the candidate day misses the event that started the day before
        assert!(find_same_day_conflict(d("2026-02-10"), &early_tenth, &existing, None).is_none());
        // while the core check catches it.
        assert_eq!(
            find_event_conflict(&early_tenth, &existing, None).map(|e| e.id.as_str()),
            Some("late")
        );

        let morning =
            TimeRange::new(at("2026-02-10T11:00:00Z"), at("2026-02-10T13:00:00Z")).unwrap();
        assert_eq!(
            find_same_day_conflict(d("2026-02-10"), &morning, &existing, None)
                .map(|e| e.id.as_str()),
            Some("next")
        );
    }

    #[test]
    fn text_and_url_helpers() {
        assert_eq!(require_text("  Week 7 ", "validation.name_required").unwrap(), "Week 7");
        assert!(matches!(
            require_text("   ", "validation.game_name_required"),
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert!(validate_url("gameImageUrl", "https://static-cdn.jtvnw.net/a.jpg").is_ok());
        assert!(validate_url("gameImageUrl", "not a url").is_err());
        assert!(validate_url("gameImageUrl", "ftp://example.com/a").is_err());
        assert_eq!(optional_url("logoUrl", Some(String::new())).unwrap(), None);
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email(" Streamer@Example.COM ").unwrap(), "streamer@example.com");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("a b@example.com").is_err());
        assert!(normalize_email("a@b..com").is_err());
        assert!(normalize_email("a@-.com").is_err());
        assert!(normalize_email("@example.com").is_err());
    }
}
