//! Calculation routes. Every handler runs behind [`require_user`] and only
//! ever touches the current user's records.
//!
//! [`require_user`]: crate::middleware::require_user

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use abacus_core::{compute_stats, export_filename, render_csv, CalculationRecord, CalculationStats};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Body of `POST /calculations`. Both fields stay raw JSON so that the
/// engine, not the deserializer, decides what is acceptable.
#[derive(Debug, Deserialize)]
pub(crate) struct CreateCalculation {
    #[serde(rename = "type", default)]
    pub kind: serde_json::Value,
    #[serde(default)]
    pub inputs: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateCalculation {
    #[serde(default)]
    pub inputs: Option<serde_json::Value>,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest("Invalid calculation id format.".to_string()))
}

/// POST /calculations
pub(crate) async fn handle_create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<CreateCalculation>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let record =
        CalculationRecord::create(user.id, &req.kind, &req.inputs, OffsetDateTime::now_utc())?;
    state.store.insert_calculation(record.clone()).await?;
    debug!(
        user_id = %user.id,
        id = %record.id(),
        operation = %record.operation(),
        "created calculation"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /calculations
pub(crate) async fn handle_list(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<CalculationRecord>>, ApiError> {
    Ok(Json(state.store.list_calculations(user.id).await?))
}

/// GET /calculations/stats
pub(crate) async fn handle_stats(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<CalculationStats>, ApiError> {
    let records = state.store.list_calculations(user.id).await?;
    Ok(Json(compute_stats(&user.id.to_string(), &records)))
}

/// GET /calculations/export and GET /calculations/report.csv
pub(crate) async fn handle_export(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let mut records = state.store.list_calculations(user.id).await?;
    records.sort_by_key(|r| r.created_at());
    let body = render_csv(&records);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(OffsetDateTime::now_utc())
    );
    info!(user_id = %user.id, rows = records.len(), "exported calculations");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// GET /calculations/{id}
pub(crate) async fn handle_get(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<CalculationRecord>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.get_calculation(user.id, id).await?))
}

/// PUT /calculations/{id}
///
/// Inputs, when present, replace the stored ones and the result is
/// recomputed. The timestamp is refreshed either way.
pub(crate) async fn handle_update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCalculation>, JsonRejection>,
) -> Result<Json<CalculationRecord>, ApiError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;

    if let Some(inputs) = &req.inputs {
        if inputs.as_array().is_some_and(|items| items.len() < 2) {
            return Err(ApiError::Unprocessable(
                "At least two numbers are required for calculation".to_string(),
            ));
        }
    }

    let mut record = state.store.get_calculation(user.id, id).await?;
    let now = OffsetDateTime::now_utc();
    match &req.inputs {
        Some(inputs) => record.replace_inputs(inputs, now)?,
        None => record.touch(now),
    }
    state.store.update_calculation(record.clone()).await?;
    debug!(user_id = %user.id, id = %id, "updated calculation");
    Ok(Json(record))
}

/// DELETE /calculations/{id}
pub(crate) async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.store.delete_calculation(user.id, id).await?;
    debug!(user_id = %user.id, id = %id, "deleted calculation");
    Ok(StatusCode::NO_CONTENT)
}
