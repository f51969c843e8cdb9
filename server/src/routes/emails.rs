use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use supportdesk::{Email, EmailSubmission};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct StatusParams {
    status: String,
}

pub(super) async fn list_filtered(State(state): State<AppState>) -> ApiResult<Json<Vec<Email>>> {
    Ok(Json(state.desk.list_filtered()?))
}

pub(super) async fn list_all(State(state): State<AppState>) -> ApiResult<Json<Vec<Email>>> {
    Ok(Json(state.desk.list_all()?))
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Email>> {
    Ok(Json(state.desk.get(id)?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(submission): Json<EmailSubmission>,
) -> ApiResult<Json<Email>> {
    Ok(Json(state.desk.create_email(submission)?))
}

/// The request body is the reply text itself.
pub(super) async fn submit_reply(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    reply: String,
) -> ApiResult<StatusCode> {
    state.desk.submit_reply(id, &reply)?;
    Ok(StatusCode::OK)
}

pub(super) async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<StatusParams>,
) -> ApiResult<StatusCode> {
    state.desk.update_status(id, &params.status)?;
    Ok(StatusCode::OK)
}

/// Returns the draft text, or the failure sentinel when generation failed.
pub(super) async fn generate_draft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<String> {
    Ok(state.desk.generate_draft(id).await?)
}

pub(super) async fn seed_demo(State(state): State<AppState>) -> ApiResult<StatusCode> {
    if state.desk.seed_demo()? {
        tracing::info!("demo email seeded");
    }
    Ok(StatusCode::OK)
}
