use chrono::{NaiveDate, Utc};
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::db::models::{CreatePlanning, Planning};
use crate::error::{AppError, AppResult};
use crate::i18n;

// ============================================================================
// Planning Repository
// ============================================================================

const PLANNING_COLUMNS: &str = "id, user_id, name, week_start, week_end, \
     bg_color, text_color, accent_color, created_at";

/// Map write failures, turning the overlap trigger abort into a conflict.
fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.message().contains("planning_overlap") {
            tracing::debug!("Overlap trigger rejected planning write");
            return AppError::conflict(i18n::t("conflict.planning_overlap_generic"));
        }
    }
    AppError::Database(e)
}

pub struct PlanningRepository;

impl PlanningRepository {
    pub async fn create<'c, E>(
        executor: E,
        user_id: &str,
        planning: &CreatePlanning,
    ) -> AppResult<Planning>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let sql = format!(
            r#"
            INSERT INTO plannings (id, user_id, name, week_start, week_end, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {PLANNING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Planning>(&sql)
            .bind(&id)
            .bind(user_id)
            .bind(&planning.name)
            .bind(planning.week_start)
            .bind(planning.week_end)
            .bind(now)
            .fetch_one(executor)
            .await
            .map_err(map_write_error)
    }

    /// Look up a planning by id, scoped to its owner. A planning owned by
    /// someone else is indistinguishable from a missing one.
    pub async fn find_owned<'c, E>(
        executor: E,
        id: &str,
        user_id: &str,
    ) -> AppResult<Option<Planning>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!("SELECT {PLANNING_COLUMNS} FROM plannings WHERE id = ? AND user_id = ?");

        sqlx::query_as::<_, Planning>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
            .map_err(AppError::Database)
    }

    /// All plannings of a user, newest first.
    pub async fn list_by_user<'c, E>(executor: E, user_id: &str) -> AppResult<Vec<Planning>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {PLANNING_COLUMNS} FROM plannings WHERE user_id = ? ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Planning>(&sql)
            .bind(user_id)
            .fetch_all(executor)
            .await
            .map_err(AppError::Database)
    }

    /// First planning of `user_id` whose closed `[week_start, week_end]`
    /// interval intersects `[start, end]`, ignoring `exclude_id`.
    pub async fn find_first_overlapping<'c, E>(
        executor: E,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<&str>,
    ) -> AppResult<Option<Planning>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            SELECT {PLANNING_COLUMNS}
            FROM plannings
            WHERE user_id = ?
              AND week_start <= ?
              AND week_end >= ?
              AND (? IS NULL OR id <> ?)
            ORDER BY week_start ASC
            LIMIT 1
            "#
        );

        sqlx::query_as::<_, Planning>(&sql)
            .bind(user_id)
            .bind(end)
            .bind(start)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_optional(executor)
            .await
            .map_err(AppError::Database)
    }

    /// Persist the given planning row as-is.
    pub async fn update<'c, E>(executor: E, planning: &Planning) -> AppResult<Planning>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            UPDATE plannings
            SET name = ?,
                week_start = ?,
                week_end = ?,
                bg_color = ?,
                text_color = ?,
                accent_color = ?
            WHERE id = ? AND user_id = ?
            RETURNING {PLANNING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Planning>(&sql)
            .bind(&planning.name)
            .bind(planning.week_start)
            .bind(planning.week_end)
            .bind(&planning.bg_color)
            .bind(&planning.text_color)
            .bind(&planning.accent_color)
            .bind(&planning.id)
            .bind(&planning.user_id)
            .fetch_one(executor)
            .await
            .map_err(map_write_error)
    }

    pub async fn delete<'c, E>(executor: E, id: &str) -> AppResult<()>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        sqlx::query("DELETE FROM plannings WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
