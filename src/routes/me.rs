use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::routes::AppJson;
use crate::services::users::{ProfileChanges, UserService};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(me).put(update_me))
}

async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Value>> {
    let user = UserService::get(&state, &user.id).await?;
    Ok(Json(json!({ "user": user })))
}

/// Update email, password, or public links of the current user.
async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    AppJson(changes): AppJson<ProfileChanges>,
) -> AppResult<Json<Value>> {
    let user = UserService::update_profile(&state, &user, changes).await?;
    Ok(Json(json!({ "user": user })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, send, token_for};
    use crate::services::test_support;

    #[tokio::test]
    async fn profile_links_absent_null_and_set() {
        let app = app(test_support::state().await);
        let token = token_for(&app, "a@example.com").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/me",
            Some(&token),
            Some(json!({ "twitchUrl": "https://twitch.tv/someone" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["twitchUrl"], "https://twitch.tv/someone");

        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/me",
            Some(&token),
            Some(json!({ "logoUrl": "https://cdn.example.com/logo.png" })),
        )
        .await;
        assert_eq!(body["user"]["twitchUrl"], "https://twitch.tv/someone");

        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/me",
            Some(&token),
            Some(json!({ "twitchUrl": null })),
        )
        .await;
        assert!(body["user"]["twitchUrl"].is_null());
        assert_eq!(body["user"]["logoUrl"], "https://cdn.example.com/logo.png");

        let (status, body) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "a@example.com");
    }

    #[tokio::test]
    async fn invalid_link_is_rejected() {
        let app = app(test_support::state().await);
        let token = token_for(&app, "a@example.com").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/me",
            Some(&token),
            Some(json!({ "logoUrl": "javascript:alert(1)" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }
}
