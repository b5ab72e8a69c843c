use std::sync::Arc;

use serde::Deserialize;

use crate::db::{UpdateUser, User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::auth::AuthService;
use crate::services::deserialize_nullable;
use crate::services::validation;
use crate::AppState;

/// Profile fields the current user may change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub twitch_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub logo_url: Option<Option<String>>,
}

pub struct UserService;

impl UserService {
    pub async fn get(state: &Arc<AppState>, user_id: &str) -> AppResult<User> {
        UserRepository::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.user")))
    }

    pub async fn update_profile(
        state: &Arc<AppState>,
        user: &User,
        changes: ProfileChanges,
    ) -> AppResult<User> {
        let update = UpdateUser {
            email: changes
                .email
                .map(|e| validation::normalize_email(&e))
                .transpose()?,
            password_hash: match changes.password {
                Some(password) => {
                    AuthService::check_password(state, &password)?;
                    Some(AuthService::hash_password(state, password).await?)
                }
                None => None,
            },
            twitch_url: changes
                .twitch_url
                .map(|url| validation::optional_url("twitchUrl", url))
                .transpose()?,
            logo_url: changes
                .logo_url
                .map(|url| validation::optional_url("logoUrl", url))
                .transpose()?,
        };

        let merged = User {
            email: update.email.unwrap_or_else(|| user.email.clone()),
            password_hash: update
                .password_hash
                .unwrap_or_else(|| user.password_hash.clone()),
            twitch_url: update.twitch_url.unwrap_or_else(|| user.twitch_url.clone()),
            logo_url: update.logo_url.unwrap_or_else(|| user.logo_url.clone()),
            ..user.clone()
        };

        if merged == *user {
            return Ok(merged);
        }

        let saved = UserRepository::save_profile(&state.db, &merged).await?;
        tracing::info!("Updated profile for user {}", saved.id);
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::Credentials;
    use crate::services::test_support;

    async fn signed_up(state: &Arc<AppState>, email: &str) -> User {
        AuthService::signup(
            state,
            Credentials {
                email: email.to_string(),
                password: "long-enough".to_string(),
            },
        )
        .await
        .unwrap()
        .user
    }

    #[tokio::test]
    async fn links_can_be_set_kept_and_cleared() {
        let state = test_support::state().await;
        let user = signed_up(&state, "a@example.com").await;

        let linked = UserService::update_profile(
            &state,
            &user,
            ProfileChanges {
                twitch_url: Some(Some("https://twitch.tv/someone".to_string())),
                logo_url: Some(Some("https://cdn.example.com/logo.png".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(linked.twitch_url.as_deref(), Some("https://twitch.tv/someone"));

        let kept = UserService::update_profile(&state, &linked, ProfileChanges::default())
            .await
            .unwrap();
        assert_eq!(kept, linked);

        let cleared = UserService::update_profile(
            &state,
            &linked,
            ProfileChanges {
                twitch_url: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.twitch_url, None);
        assert_eq!(cleared.logo_url.as_deref(), Some("https://cdn.example.com/logo.png"));
    }

    #[tokio::test]
    async fn rejects_bad_links_and_taken_email() {
        let state = test_support::state().await;
        let user = signed_up(&state, "a@example.com").await;
        signed_up(&state, "b@example.com").await;

        let bad_url = UserService::update_profile(
            &state,
            &user,
            ProfileChanges {
                logo_url: Some(Some("ftp://example.com/logo.png".to_string())),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(bad_url, Err(AppError::InvalidInput(_))));

        let taken = UserService::update_profile(
            &state,
            &user,
            ProfileChanges {
                email: Some("B@example.com".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(taken, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn password_change_takes_effect() {
        let state = test_support::state().await;
        let user = signed_up(&state, "a@example.com").await;

        let short = UserService::update_profile(
            &state,
            &user,
            ProfileChanges {
                password: Some("short".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(short, Err(AppError::InvalidInput(_))));

        UserService::update_profile(
            &state,
            &user,
            ProfileChanges {
                password: Some("a-new-password".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let login = AuthService::login(
            &state,
            Credentials {
                email: "a@example.com".to_string(),
                password: "a-new-password".to_string(),
            },
        )
        .await;
        assert!(login.is_ok());
    }
}
