//! Account routes: register, login, refresh.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use abacus_storage::UserRecord;

use crate::auth::{hash_password, verify_password, TokenKind};
use crate::error::ApiError;
use crate::state::AppState;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const NAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterRequest {
    /// Check field shapes and password strength. The first failing rule
    /// is reported.
    fn validate(&self) -> Result<(), String> {
        let username_len = self.username.trim().chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
            return Err(format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN, USERNAME_MAX
            ));
        }
        if !is_plausible_email(self.email.trim()) {
            return Err("Invalid email address".to_string());
        }
        for (field, value) in [
            ("First name", &self.first_name),
            ("Last name", &self.last_name),
        ] {
            let len = value.trim().chars().count();
            if len == 0 || len > NAME_MAX {
                return Err(format!(
                    "{} must be between 1 and {} characters",
                    field, NAME_MAX
                ));
            }
        }
        validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err("Passwords do not match".to_string());
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(format!(
            "Password must be between {} and {} characters",
            PASSWORD_MIN, PASSWORD_MAX
        ));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }
    if !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        return Err("Password must contain at least one special character".to_string());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    /// Username or email.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    expires_at: OffsetDateTime,
    user_id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    is_active: bool,
    is_verified: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessTokenResponse {
    access_token: String,
    token_type: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    expires_at: OffsetDateTime,
}

/// POST /auth/register
pub(crate) async fn handle_register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::Unprocessable)?;

    let cost = state.password_cost;
    let password = req.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let now = OffsetDateTime::now_utc();
    let user = UserRecord {
        id: Uuid::new_v4(),
        username: req.username.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        password_hash,
        is_active: true,
        is_verified: false,
        created_at: now,
        updated_at: now,
        last_login: None,
    };
    state.store.insert_user(user.clone()).await?;
    info!(user_id = %user.id, username = %user.username, "registered user");

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login
pub(crate) async fn handle_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(req) = payload?;
    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let login = req.username.trim();
    let user = match state.store.find_user_by_login(login).await? {
        Some(user) if user.is_active => user,
        _ => {
            warn!(login, "login failed: unknown or inactive account");
            return Err(invalid());
        }
    };

    let hash = user.password_hash.clone();
    let password = req.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !matches {
        warn!(login, "login failed: wrong password");
        return Err(invalid());
    }

    let now = OffsetDateTime::now_utc();
    state.store.record_login(user.id, now).await?;
    let access = state.tokens.issue(user.id, TokenKind::Access, now)?;
    let refresh = state.tokens.issue(user.id, TokenKind::Refresh, now)?;
    info!(user_id = %user.id, "login");

    Ok(Json(TokenResponse {
        access_token: access.token,
        refresh_token: refresh.token,
        token_type: "bearer",
        expires_at: access.expires_at,
        user_id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        is_active: user.is_active,
        is_verified: user.is_verified,
    }))
}

/// POST /auth/refresh
pub(crate) async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let Json(req) = payload?;
    let user_id = state.tokens.verify(&req.refresh_token, TokenKind::Refresh)?;
    let user = state.store.get_user(user_id).await?;
    if !user.is_active {
        return Err(ApiError::Forbidden("Inactive user".to_string()));
    }
    let access = state
        .tokens
        .issue(user.id, TokenKind::Access, OffsetDateTime::now_utc())?;
    Ok(Json(AccessTokenResponse {
        access_token: access.token,
        token_type: "bearer",
        expires_at: access.expires_at,
    }))
}
