use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts},
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::AppState;

pub mod auth;
pub mod events;
pub mod health;
pub mod me;
pub mod plannings;

/// Everything except `/api/auth`, which `main` nests behind the rate limiter.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/me", me::router())
        .nest("/api/plannings", plannings::router())
        .nest("/api/events", events::router())
}

/// `axum::Json` with rejections reported as `INVALID_INPUT`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` with rejections reported as `INVALID_INPUT`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Path ids must be UUIDs; they are stored lowercase-hyphenated.
pub fn parse_id(raw: &str) -> AppResult<String> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| {
            AppError::InvalidInput(crate::i18n::t_with(
                "validation.invalid_id",
                &[("value", raw)],
            ))
        })
}
