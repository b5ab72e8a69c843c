use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{
    CreatePlanning, Event, EventRepository, Planning, PlanningRepository, PlanningWithEvents,
    UpdatePlanning,
};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::deserialize_nullable;
use crate::services::validation::{self, DateRange};
use crate::time::{self, end_of_week, format_time_hhmm, start_of_week, utc_day, week_days};

// ============================================================================
// Inputs / Outputs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlanning {
    pub name: String,
    pub week_start: String,
    pub week_end: String,
}

/// Requested planning changes as received from the client. Dates are raw
/// `YYYY-MM-DD` literals; colors distinguish absent from `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningChanges {
    pub name: Option<String>,
    pub week_start: Option<String>,
    pub week_end: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub bg_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub text_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub accent_color: Option<Option<String>>,
}

impl PlanningChanges {
    fn parse(self) -> AppResult<UpdatePlanning> {
        Ok(UpdatePlanning {
            name: self
                .name
                .map(|n| validation::require_text(&n, "validation.name_required"))
                .transpose()?,
            week_start: self
                .week_start
                .map(|s| time::parse_calendar_date(&s))
                .transpose()?,
            week_end: self
                .week_end
                .map(|s| time::parse_calendar_date(&s))
                .transpose()?,
            bg_color: self.bg_color.map(validation::optional_text),
            text_color: self.text_color.map(validation::optional_text),
            accent_color: self.accent_color.map(validation::optional_text),
        })
    }
}

/// An event with its start/end as wall-clock `HH:MM` at the requested offset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    #[serde(flatten)]
    pub event: Event,
    pub start_time: String,
    pub end_time: String,
}

impl ScheduledEvent {
    fn new(event: Event, offset: FixedOffset) -> Self {
        Self {
            start_time: format_time_hhmm(event.starts_at, offset),
            end_time: format_time_hhmm(event.ends_at, offset),
            event,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub events: Vec<ScheduledEvent>,
}

/// A planning laid out day by day over its range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningSchedule {
    pub planning: Planning,
    pub days: Vec<ScheduleDay>,
    /// Events whose start falls outside the planning's days.
    pub unscheduled: Vec<ScheduledEvent>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedWeek {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

fn not_found() -> AppError {
    AppError::NotFound(i18n::t("not_found.planning"))
}

/// Apply `update` on top of `existing`; unset fields keep their stored value.
fn merge(existing: &Planning, update: UpdatePlanning) -> Planning {
    Planning {
        name: update.name.unwrap_or_else(|| existing.name.clone()),
        week_start: update.week_start.unwrap_or(existing.week_start),
        week_end: update.week_end.unwrap_or(existing.week_end),
        bg_color: update.bg_color.unwrap_or_else(|| existing.bg_color.clone()),
        text_color: update
            .text_color
            .unwrap_or_else(|| existing.text_color.clone()),
        accent_color: update
            .accent_color
            .unwrap_or_else(|| existing.accent_color.clone()),
        ..existing.clone()
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct PlanningService;

impl PlanningService {
    pub async fn list(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<Planning>> {
        PlanningRepository::list_by_user(pool, user_id).await
    }

    /// Planning with its events, scoped to the owner.
    pub async fn get(pool: &SqlitePool, user_id: &str, id: &str) -> AppResult<PlanningWithEvents> {
        let planning = PlanningRepository::find_owned(pool, id, user_id)
            .await?
            .ok_or_else(not_found)?;
        let events = EventRepository::list_by_planning(pool, &planning.id).await?;

        Ok(PlanningWithEvents { planning, events })
    }

    /// Group a planning's events by UTC start day over `week_start..=week_end`.
    /// Display times are rendered at `offset`; grouping stays on UTC days.
    pub async fn schedule(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        offset: FixedOffset,
    ) -> AppResult<PlanningSchedule> {
        let PlanningWithEvents { planning, events } = Self::get(pool, user_id, id).await?;

        let mut days: Vec<ScheduleDay> = week_days(planning.week_start, planning.week_end)
            .map(|date| ScheduleDay {
                date,
                events: Vec::new(),
            })
            .collect();
        let mut unscheduled = Vec::new();

        for event in events {
            let day = utc_day(event.starts_at);
            let scheduled = ScheduledEvent::new(event, offset);
            match days.iter_mut().find(|d| d.date == day) {
                Some(slot) => slot.events.push(scheduled),
                None => unscheduled.push(scheduled),
            }
        }

        Ok(PlanningSchedule {
            planning,
            days,
            unscheduled,
        })
    }

    /// Sunday..Saturday window containing `date` (today when absent).
    pub fn suggested_week(date: Option<&str>) -> AppResult<SuggestedWeek> {
        let anchor = match date {
            Some(s) => time::parse_calendar_date(s)?,
            None => Utc::now().date_naive(),
        };
        Ok(SuggestedWeek {
            week_start: start_of_week(anchor),
            week_end: end_of_week(anchor),
        })
    }

    pub async fn create(
        pool: &SqlitePool,
        user_id: &str,
        input: NewPlanning,
    ) -> AppResult<Planning> {
        let name = validation::require_text(&input.name, "validation.name_required")?;
        let week_start = time::parse_calendar_date(&input.week_start)?;
        let week_end = time::parse_calendar_date(&input.week_end)?;
        let range = DateRange::new(week_start, week_end)?;

        let mut tx = super::begin_write(pool, user_id).await?;
        validation::assert_no_planning_overlap(&mut *tx, user_id, range, None).await?;
        let planning = PlanningRepository::create(
            &mut *tx,
            user_id,
            &CreatePlanning {
                name,
                week_start,
                week_end,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            "Created planning {} ({}..{}) for user {}",
            planning.id,
            planning.week_start,
            planning.week_end,
            user_id
        );
        Ok(planning)
    }

    pub async fn update(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        changes: PlanningChanges,
    ) -> AppResult<Planning> {
        let update = changes.parse()?;

        let mut tx = super::begin_write(pool, user_id).await?;
        let existing = PlanningRepository::find_owned(&mut *tx, id, user_id)
            .await?
            .ok_or_else(not_found)?;

        let merged = merge(&existing, update);
        let range = DateRange::new(merged.week_start, merged.week_end)?;
        validation::assert_no_planning_overlap(&mut *tx, user_id, range, Some(&existing.id))
            .await?;

        if merged == existing {
            tracing::debug!("Planning {} unchanged, skipping write", existing.id);
            return Ok(existing);
        }

        let planning = PlanningRepository::update(&mut *tx, &merged).await?;
        tx.commit().await?;

        tracing::info!("Updated planning {} for user {}", planning.id, user_id);
        Ok(planning)
    }

    /// Delete a planning and every event it owns.
    pub async fn delete(pool: &SqlitePool, user_id: &str, id: &str) -> AppResult<()> {
        let mut tx = super::begin_write(pool, user_id).await?;
        let existing = PlanningRepository::find_owned(&mut *tx, id, user_id)
            .await?
            .ok_or_else(not_found)?;

        let removed = EventRepository::delete_by_planning(&mut *tx, &existing.id).await?;
        PlanningRepository::delete(&mut *tx, &existing.id).await?;
        tx.commit().await?;

        tracing::info!(
            "Deleted planning {} ({} events) for user {}",
            existing.id,
            removed,
            user_id
        );
        Ok(())
    }
}
