use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{CreateEvent, Event, EventRepository, PlanningRepository, UpdateEvent};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::deserialize_nullable;
use crate::services::validation::{self, TimeRange};
use crate::time::{self, utc_day};

/// When an event runs: either two instants, or a day with wall-clock
/// `HH:MM` start/end at a fixed offset (minutes east of UTC, default 0).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventWindow {
    #[serde(rename_all = "camelCase")]
    Instants { starts_at: String, ends_at: String },
    #[serde(rename_all = "camelCase")]
    WallClock {
        day: String,
        start_time: String,
        end_time: String,
        utc_offset_minutes: Option<i32>,
    },
}

impl EventWindow {
    fn resolve(&self) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        match self {
            EventWindow::Instants { starts_at, ends_at } => {
                Ok((time::parse_instant(starts_at)?, time::parse_instant(ends_at)?))
            }
            EventWindow::WallClock {
                day,
                start_time,
                end_time,
                utc_offset_minutes,
            } => {
                let day = time::parse_calendar_date(day)?;
                let offset = time::offset_from_minutes(utc_offset_minutes.unwrap_or(0))?;
                Ok((
                    time::instant_from_day_and_time(day, start_time, offset)?,
                    time::instant_from_day_and_time(day, end_time, offset)?,
                ))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: Option<String>,
    pub game_name: String,
    pub game_image_url: Option<String>,
    #[serde(flatten)]
    pub window: EventWindow,
}

impl NewEvent {
    fn parse(self) -> AppResult<CreateEvent> {
        let (starts_at, ends_at) = self.window.resolve()?;
        Ok(CreateEvent {
            title: validation::optional_text(self.title),
            game_name: validation::require_text(&self.game_name, "validation.game_name_required")?,
            game_image_url: validation::optional_url("gameImageUrl", self.game_image_url)?,
            starts_at,
            ends_at,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventChanges {
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub title: Option<Option<String>>,
    pub game_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub game_image_url: Option<Option<String>>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

impl EventChanges {
    fn parse(self) -> AppResult<UpdateEvent> {
        Ok(UpdateEvent {
            title: self.title.map(validation::optional_text),
            game_name: self
                .game_name
                .map(|n| validation::require_text(&n, "validation.game_name_required"))
                .transpose()?,
            game_image_url: self
                .game_image_url
                .map(|url| validation::optional_url("gameImageUrl", url))
                .transpose()?,
            starts_at: self
                .starts_at
                .map(|s| time::parse_instant(&s))
                .transpose()?,
            ends_at: self.ends_at.map(|s| time::parse_instant(&s)).transpose()?,
        })
    }
}

/// Candidate slot for the advisory same-day check.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub starts_at: String,
    pub ends_at: String,
    pub exclude_event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotCheck {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<Event>,
}

fn event_not_found() -> AppError {
    AppError::NotFound(i18n::t("not_found.event"))
}

fn merge(existing: &Event, update: UpdateEvent) -> Event {
    Event {
        title: update.title.unwrap_or_else(|| existing.title.clone()),
        game_name: update
            .game_name
            .unwrap_or_else(|| existing.game_name.clone()),
        game_image_url: update
            .game_image_url
            .unwrap_or_else(|| existing.game_image_url.clone()),
        starts_at: update.starts_at.unwrap_or(existing.starts_at),
        ends_at: update.ends_at.unwrap_or(existing.ends_at),
        ..existing.clone()
    }
}

pub struct EventService;

impl EventService {
    pub async fn create(
        pool: &SqlitePool,
        user_id: &str,
        planning_id: &str,
        input: NewEvent,
    ) -> AppResult<Event> {
        let event = input.parse()?;

        let mut tx = super::begin_write(pool, user_id).await?;
        let planning = PlanningRepository::find_owned(&mut *tx, planning_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.planning")))?;

        let range = TimeRange::new(event.starts_at, event.ends_at)?;
        let siblings = EventRepository::list_by_planning(&mut *tx, &planning.id).await?;
        validation::assert_no_event_overlap(&range, &siblings, None)?;

        let created = EventRepository::create(&mut *tx, &planning.id, &event).await?;
        tx.commit().await?;

        tracing::info!(
            "Created event {} in planning {} ({} -> {})",
            created.id,
            planning.id,
            created.starts_at,
            created.ends_at
        );
        Ok(created)
    }

    pub async fn update(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        changes: EventChanges,
    ) -> AppResult<Event> {
        let update = changes.parse()?;

        let mut tx = super::begin_write(pool, user_id).await?;
        let existing = EventRepository::find_owned(&mut *tx, id, user_id)
            .await?
            .ok_or_else(event_not_found)?;

        let merged = merge(&existing, update);
        let range = TimeRange::new(merged.starts_at, merged.ends_at)?;
        let siblings = EventRepository::list_by_planning(&mut *tx, &existing.planning_id).await?;
        validation::assert_no_event_overlap(&range, &siblings, Some(&existing.id))?;

        if merged == existing {
            tracing::debug!("Event {} unchanged, skipping write", existing.id);
            return Ok(existing);
        }

        let event = EventRepository::update(&mut *tx, &merged).await?;
        tx.commit().await?;

        tracing::info!("Updated event {} for user {}", event.id, user_id);
        Ok(event)
    }

    pub async fn delete(pool: &SqlitePool, user_id: &str, id: &str) -> AppResult<()> {
        let mut tx = super::begin_write(pool, user_id).await?;
        let existing = EventRepository::find_owned(&mut *tx, id, user_id)
            .await?
            .ok_or_else(event_not_found)?;

        EventRepository::delete(&mut *tx, &existing.id).await?;
        tx.commit().await?;

        tracing::info!("Deleted event {} for user {}", existing.id, user_id);
        Ok(())
    }

    /// Advisory check: does the slot clash with another event starting the
    /// same UTC day? Never writes.
    pub async fn check_slot(
        pool: &SqlitePool,
        user_id: &str,
        planning_id: &str,
        query: SlotQuery,
    ) -> AppResult<SlotCheck> {
        let starts_at = time::parse_instant(&query.starts_at)?;
        let ends_at = time::parse_instant(&query.ends_at)?;

        let planning = PlanningRepository::find_owned(pool, planning_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.planning")))?;
        let range = TimeRange::new(starts_at, ends_at)?;

        let events = EventRepository::list_by_planning(pool, &planning.id).await?;
        let conflict = validation::find_same_day_conflict(
            utc_day(range.start),
            &range,
            &events,
            query.exclude_event_id.as_deref(),
        )
        .cloned();

        Ok(SlotCheck {
            available: conflict.is_none(),
            conflict,
        })
    }
}
