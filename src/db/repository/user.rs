use chrono::Utc;
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::i18n;

const USER_COLUMNS: &str = "id, email, password_hash, twitch_url, logo_url, created_at";

/// Unique email violations become a conflict instead of a 500.
fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return AppError::conflict(i18n::t("conflict.email_in_use"));
        }
    }
    AppError::Database(e)
}

pub struct UserRepository;

impl UserRepository {
    pub async fn create<'c, E>(executor: E, email: &str, password_hash: &str) -> AppResult<User>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&id)
            .bind(email)
            .bind(password_hash)
            .bind(now)
            .fetch_one(executor)
            .await
            .map_err(map_write_error)
    }

    pub async fn find_by_id<'c, E>(executor: E, id: &str) -> AppResult<Option<User>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(AppError::Database)
    }

    pub async fn find_by_email<'c, E>(executor: E, email: &str) -> AppResult<Option<User>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(executor)
            .await
            .map_err(AppError::Database)
    }

    /// Take the database write lock for the surrounding transaction.
    ///
    /// Must be the first statement of that transaction. A deferred
    /// transaction that has already read cannot upgrade while another writer
    /// holds the lock and fails with SQLITE_BUSY instead of waiting.
    pub async fn lock_for_write<'c, E>(executor: E, id: &str) -> AppResult<()>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        sqlx::query("UPDATE users SET created_at = created_at WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    /// Persist profile columns of the given user row.
    pub async fn save_profile<'c, E>(executor: E, user: &User) -> AppResult<User>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            UPDATE users
            SET email = ?,
                password_hash = ?,
                twitch_url = ?,
                logo_url = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.twitch_url)
            .bind(&user.logo_url)
            .bind(&user.id)
            .fetch_one(executor)
            .await
            .map_err(map_write_error)
    }
}
