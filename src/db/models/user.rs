use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,

    // Public profile links shown on exported schedules
    pub twitch_url: Option<String>,
    pub logo_url: Option<String>,

    pub created_at: NaiveDateTime,
}

/// Profile changes. Outer `None` keeps the current value; `Some(None)` clears
/// a nullable column.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub twitch_url: Option<Option<String>>,
    pub logo_url: Option<Option<String>>,
}
