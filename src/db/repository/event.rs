use chrono::Utc;
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::db::models::{CreateEvent, Event};
use crate::error::{AppError, AppResult};

// ============================================================================
// Event Repository
// ============================================================================

const EVENT_COLUMNS: &str = "id, planning_id, title, game_name, game_image_url, \
     starts_at, ends_at, created_at";

pub struct EventRepository;

impl EventRepository {
    pub async fn create<'c, E>(
        executor: E,
        planning_id: &str,
        event: &CreateEvent,
    ) -> AppResult<Event>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let sql = format!(
            r#"
            INSERT INTO events (
                id, planning_id, title, game_name, game_image_url, starts_at, ends_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {EVENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Event>(&sql)
            .bind(&id)
            .bind(planning_id)
            .bind(&event.title)
            .bind(&event.game_name)
            .bind(&event.game_image_url)
            .bind(event.starts_at)
            .bind(event.ends_at)
            .bind(now)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)
    }

    /// Look up an event whose parent planning belongs to `user_id`.
    pub async fn find_owned<'c, E>(
        executor: E,
        id: &str,
        user_id: &str,
    ) -> AppResult<Option<Event>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = r#"
            SELECT e.id, e.planning_id, e.title, e.game_name, e.game_image_url,
                   e.starts_at, e.ends_at, e.created_at
            FROM events e
            JOIN plannings p ON p.id = e.planning_id
            WHERE e.id = ? AND p.user_id = ?
        "#;

        sqlx::query_as::<_, Event>(sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
            .map_err(AppError::Database)
    }

    /// Events of a planning ordered by start.
    pub async fn list_by_planning<'c, E>(executor: E, planning_id: &str) -> AppResult<Vec<Event>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE planning_id = ? ORDER BY starts_at ASC"
        );

        let mut events = sqlx::query_as::<_, Event>(&sql)
            .bind(planning_id)
            .fetch_all(executor)
            .await
            .map_err(AppError::Database)?;

        // Text ordering can differ from instant ordering when sub-second precision varies
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }

    /// Persist the given event row as-is.
    pub async fn update<'c, E>(executor: E, event: &Event) -> AppResult<Event>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            UPDATE events
            SET title = ?,
                game_name = ?,
                game_image_url = ?,
                starts_at = ?,
                ends_at = ?
            WHERE id = ?
            RETURNING {EVENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Event>(&sql)
            .bind(&event.title)
            .bind(&event.game_name)
            .bind(&event.game_image_url)
            .bind(event.starts_at)
            .bind(event.ends_at)
            .bind(&event.id)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)
    }

    pub async fn delete<'c, E>(executor: E, id: &str) -> AppResult<()>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Remove every event of a planning, returning how many were deleted.
    pub async fn delete_by_planning<'c, E>(executor: E, planning_id: &str) -> AppResult<u64>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM events WHERE planning_id = ?")
            .bind(planning_id)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
