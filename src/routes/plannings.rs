use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::routes::{events, parse_id, AppJson, AppQuery};
use crate::services::plannings::{
    NewPlanning, PlanningChanges, PlanningSchedule, PlanningService, SuggestedWeek,
};
use crate::time;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_plannings).post(create_planning))
        .route("/suggested-week", get(suggested_week))
        .route(
            "/:id",
            get(get_planning).put(update_planning).delete(delete_planning),
        )
        .route("/:id/schedule", get(get_schedule))
        .route("/:id/events", post(events::create_event))
        .route("/:id/slot-check", post(events::check_slot))
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuery {
    /// Minutes east of UTC for the rendered `HH:MM` times.
    pub utc_offset_minutes: Option<i32>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_plannings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Value>> {
    let plannings = PlanningService::list(&state.db, &user.id).await?;
    Ok(Json(json!({ "plannings": plannings })))
}

async fn create_planning(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    AppJson(request): AppJson<NewPlanning>,
) -> AppResult<impl IntoResponse> {
    let planning = PlanningService::create(&state.db, &user.id, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "planning": planning }))))
}

/// Sunday..Saturday week around `?date=` (today by default).
async fn suggested_week(
    AuthUser(_user): AuthUser,
    AppQuery(query): AppQuery<WeekQuery>,
) -> AppResult<Json<SuggestedWeek>> {
    Ok(Json(PlanningService::suggested_week(query.date.as_deref())?))
}

async fn get_planning(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id)?;
    let planning = PlanningService::get(&state.db, &user.id, &id).await?;
    Ok(Json(json!({ "planning": planning })))
}

async fn update_planning(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    AppJson(request): AppJson<PlanningChanges>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id)?;
    let planning = PlanningService::update(&state.db, &user.id, &id, request).await?;
    Ok(Json(json!({ "planning": planning })))
}

async fn delete_planning(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;
    PlanningService::delete(&state.db, &user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_schedule(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    AppQuery(query): AppQuery<ScheduleQuery>,
) -> AppResult<Json<PlanningSchedule>> {
    let id = parse_id(&id)?;
    let offset = time::offset_from_minutes(query.utc_offset_minutes.unwrap_or(0))?;
    Ok(Json(
        PlanningService::schedule(&state.db, &user.id, &id, offset).await?,
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, send, token_for};
    use crate::services::test_support;

    #[tokio::test]
    async fn planning_lifecycle_over_http() {
        let app = app(test_support::state().await);
        let token = token_for(&app, "a@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/plannings",
            Some(&token),
            Some(json!({ "name": "Week 7", "weekStart": "2026-02-09", "weekEnd": "2026-02-15" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["planning"]["weekStart"], "2026-02-09");
        let id = body["planning"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/plannings",
            Some(&token),
            Some(json!({ "name": "Clash", "weekStart": "2026-02-15", "weekEnd": "2026-02-20" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["error"]["details"]["planningId"], id.as_str());

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/plannings/{}", id),
            Some(&token),
            Some(json!({ "name": "Week seven", "accentColor": "#9146ff" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["planning"]["name"], "Week seven");
        assert_eq!(body["planning"]["accentColor"], "#9146ff");

        let (status, body) = send(&app, Method::GET, "/api/plannings", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plannings"].as_array().unwrap().len(), 1);

        let uri = format!("/api/plannings/{}", id);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn reversed_range_and_bad_date_are_400() {
        let app = app(test_support::state().await);
        let token = token_for(&app, "a@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/plannings",
            Some(&token),
            Some(json!({ "name": "W", "weekStart": "2026-03-10", "weekEnd": "2026-03-09" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_RANGE");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/plannings",
            Some(&token),
            Some(json!({ "name": "W", "weekStart": "10/03/2026", "weekEnd": "2026-03-12" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn non_uuid_path_is_invalid_input() {
        let app = app(test_support::state().await);
        let token = token_for(&app, "a@example.com").await;

        let (status, body) =
            send(&app, Method::GET, "/api/plannings/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn other_users_planning_is_not_found() {
        let app = app(test_support::state().await);
        let alice = token_for(&app, "alice@example.com").await;
        let bob = token_for(&app, "bob@example.com").await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/plannings",
            Some(&alice),
            Some(json!({ "name": "Mine", "weekStart": "2026-02-09", "weekEnd": "2026-02-15" })),
        )
        .await;
        let uri = format!("/api/plannings/{}", body["planning"]["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn schedule_renders_local_times() {
        let app = app(test_support::state().await);
        let token = token_for(&app, "a@example.com").await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/plannings",
            Some(&token),
            Some(json!({ "name": "Week 7", "weekStart": "2026-02-09", "weekEnd": "2026-02-15" })),
        )
        .await;
        let id = body["planning"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/plannings/{}/events", id),
            Some(&token),
            Some(json!({
                "gameName": "Celeste",
                "day": "2026-02-09",
                "startTime": "21:00",
                "endTime": "23:00",
                "utcOffsetMinutes": -300
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/plannings/{}/schedule?utcOffsetMinutes=-300", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // 21:00 at UTC-5 starts on the next UTC day
        assert!(body["days"][0]["events"].as_array().unwrap().is_empty());
        let event = &body["days"][1]["events"][0];
        assert_eq!(event["gameName"], "Celeste");
        assert_eq!(event["startTime"], "21:00");
        assert_eq!(event["startsAt"], "2026-02-10T02:00:00Z");
    }

    #[tokio::test]
    async fn malformed_query_uses_error_envelope() {
        let app = app(test_support::state().await);
        let token = token_for(&app, "a@example.com").await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/plannings",
            Some(&token),
            Some(json!({ "name": "Week 7", "weekStart": "2026-02-09", "weekEnd": "2026-02-15" })),
        )
        .await;
        let id = body["planning"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/plannings/{}/schedule?utcOffsetMinutes=abc", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/plannings/{}/schedule?utcOffsetMinutes=5000", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn suggested_week_for_date() {
        let app = app(test_support::state().await);
        let token = token_for(&app, "a@example.com").await;

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/plannings/suggested-week?date=2026-02-11",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "weekStart": "2026-02-08", "weekEnd": "2026-02-14" }));
    }
}
