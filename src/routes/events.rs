use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::put,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::routes::{parse_id, AppJson};
use crate::services::events::{EventChanges, EventService, NewEvent, SlotCheck, SlotQuery};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:id", put(update_event).delete(delete_event))
}

/// `POST /api/plannings/:id/events`
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(planning_id): Path<String>,
    AppJson(request): AppJson<NewEvent>,
) -> AppResult<impl IntoResponse> {
    let planning_id = parse_id(&planning_id)?;
    let event = EventService::create(&state.db, &user.id, &planning_id, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "event": event }))))
}

/// `POST /api/plannings/:id/slot-check`
pub async fn check_slot(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(planning_id): Path<String>,
    AppJson(query): AppJson<SlotQuery>,
) -> AppResult<Json<SlotCheck>> {
    let planning_id = parse_id(&planning_id)?;
    let check = EventService::check_slot(&state.db, &user.id, &planning_id, query).await?;
    Ok(Json(check))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    AppJson(request): AppJson<EventChanges>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id)?;
    let event = EventService::update(&state.db, &user.id, &id, request).await?;
    Ok(Json(json!({ "event": event })))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;
    EventService::delete(&state.db, &user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
