use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::{User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::validation;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A freshly issued bearer token and the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct AuthService;

impl AuthService {
    /// Create an account and sign it in.
    pub async fn signup(state: &Arc<AppState>, credentials: Credentials) -> AppResult<Session> {
        let email = validation::normalize_email(&credentials.email)?;
        Self::check_password(state, &credentials.password)?;

        if UserRepository::find_by_email(&state.db, &email).await?.is_some() {
            return Err(AppError::conflict(i18n::t("conflict.email_in_use")));
        }

        let hash = Self::hash_password(state, credentials.password).await?;
        let user = UserRepository::create(&state.db, &email, &hash).await?;
        tracing::info!("Created user {}", user.id);

        let token = Self::create_jwt(state, &user.id)?;
        Ok(Session { token, user })
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(state: &Arc<AppState>, credentials: Credentials) -> AppResult<Session> {
        let email = credentials.email.trim().to_lowercase();
        let user = UserRepository::find_by_email(&state.db, &email)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Login attempt for unknown email");
                AppError::InvalidCredentials
            })?;

        if !Self::verify_password(credentials.password, user.password_hash.clone()).await? {
            tracing::debug!("Wrong password for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        let token = Self::create_jwt(state, &user.id)?;
        Ok(Session { token, user })
    }

    /// Minimum length check shared by signup and password changes.
    pub fn check_password(state: &Arc<AppState>, password: &str) -> AppResult<()> {
        let min = state.config.auth.min_password_length;
        if password.chars().count() < min {
            return Err(AppError::InvalidInput(i18n::t_with(
                "validation.password_too_short",
                &[("min", &min.to_string())],
            )));
        }
        Ok(())
    }

    /// bcrypt is CPU-bound, so hashing runs on the blocking pool.
    pub async fn hash_password(state: &Arc<AppState>, password: String) -> AppResult<String> {
        let cost = state.config.auth.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e))
            })??;
        Ok(hash)
    }

    pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
        let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Password check task failed: {}", e))
            })??;
        Ok(ok)
    }

    /// Create a signed JWT for a user id
    pub fn create_jwt(state: &Arc<AppState>, user_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(state.config.jwt.expiration_hours);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.jwt.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Decode and validate a JWT, returning the claims
    pub fn decode_jwt(state: &Arc<AppState>, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Resolve a bearer token to its user; a token for a deleted user is rejected.
    pub async fn get_user_from_token(state: &Arc<AppState>, token: &str) -> AppResult<User> {
        let claims = Self::decode_jwt(state, token)?;
        let user = UserRepository::find_by_id(&state.db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(user)
    }
}
