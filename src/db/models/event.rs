use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Event Models (one stream session inside a planning)
// ============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub planning_id: String,
    pub title: Option<String>,
    pub game_name: String,
    pub game_image_url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: Option<String>,
    pub game_name: String,
    pub game_image_url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Partial event update; see `UpdatePlanning` for the `Option<Option<_>>` convention.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub title: Option<Option<String>>,
    pub game_name: Option<String>,
    pub game_image_url: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}
