use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Event;

// ============================================================================
// Planning Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planning {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub accent_color: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CreatePlanning {
    pub name: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

/// Partial planning update. Outer `None` keeps the stored value; for the
/// color columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlanning {
    pub name: Option<String>,
    pub week_start: Option<NaiveDate>,
    pub week_end: Option<NaiveDate>,
    pub bg_color: Option<Option<String>>,
    pub text_color: Option<Option<String>>,
    pub accent_color: Option<Option<String>>,
}

/// A planning together with its events ordered by start.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningWithEvents {
    #[serde(flatten)]
    pub planning: Planning,
    pub events: Vec<Event>,
}
