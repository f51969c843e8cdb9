use axum::extract::State;
use axum::Json;
use serde::Serialize;
use supportdesk::db::stats_repo::Analytics;

use crate::error::ApiResult;
use crate::state::AppState;

pub const FETCH_OK: &str = "Emails fetched successfully";

#[derive(Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub(super) async fn analytics(State(state): State<AppState>) -> ApiResult<Json<Analytics>> {
    Ok(Json(state.desk.analytics()?))
}

/// Runs one ingestion cycle. Always answers 200 with a one-line outcome,
/// which is what the dashboard's "Fetch" button displays.
pub(super) async fn fetch(State(state): State<AppState>) -> String {
    match state.desk.fetch_mail().await {
        Ok(report) => {
            tracing::info!(
                fetched = report.fetched,
                stored = report.stored,
                "fetch triggered over HTTP"
            );
            FETCH_OK.to_string()
        }
        Err(error) => {
            tracing::error!(%error, "fetch triggered over HTTP failed");
            format!("Error: {}", error)
        }
    }
}
