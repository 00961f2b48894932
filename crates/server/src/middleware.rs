//! Bearer-token authentication for the calculation routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use abacus_storage::UserRecord;

use crate::auth::TokenKind;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated, active user behind the current request.
#[derive(Debug, Clone)]
pub(crate) struct CurrentUser(pub(crate) UserRecord);

/// Resolve `Authorization: Bearer <access token>` to an active user.
///
/// Missing, malformed, expired or refresh-typed tokens get 401; a valid
/// token for a deactivated account gets 403.
pub(crate) async fn require_user(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    // Owned before awaiting: the request body is not `Sync`.
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match authenticate(&state, auth_header.as_deref()).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "rejected request");
            e.into_response()
        }
    }
}

async fn authenticate(
    state: &AppState,
    auth_header: Option<&str>,
) -> Result<UserRecord, ApiError> {
    let token = bearer_token(auth_header)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let user_id = state.tokens.verify(token, TokenKind::Access)?;
    let user = state.store.get_user(user_id).await?;
    if !user.is_active {
        return Err(ApiError::Forbidden("Inactive user".to_string()));
    }
    Ok(user)
}

fn bearer_token(auth_header: Option<&str>) -> Option<&str> {
    auth_header
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
