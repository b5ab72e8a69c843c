use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::routes::AppJson;
use crate::services::auth::{AuthService, Credentials};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

// ============================================================================
// Handlers
// ============================================================================

async fn signup(
    State(state): State<Arc<AppState>>,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<impl IntoResponse> {
    let session = AuthService::signup(&state, credentials).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<impl IntoResponse> {
    let session = AuthService::login(&state, credentials).await?;
    tracing::debug!("User {} logged in", session.user.id);
    Ok(Json(session))
}

// ============================================================================
// Auth Extractor
// ============================================================================

/// Extractor for authenticated user
pub struct AuthUser(pub crate::db::User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        let token = match auth_header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => {
                tracing::debug!("Authorization header is not a bearer token");
                return Err(AppError::Unauthorized);
            }
        };
        if token.is_empty() {
            tracing::debug!("Empty bearer token in Authorization header");
            return Err(AppError::Unauthorized);
        }

        let user = AuthService::get_user_from_token(state, token)
            .await
            .map_err(|e| {
                tracing::debug!("Failed to get user from token: {:?}", e);
                match e {
                    AppError::Jwt(_) | AppError::Unauthorized => AppError::Unauthorized,
                    other => other,
                }
            })?;

        Ok(AuthUser(user))
    }
}
