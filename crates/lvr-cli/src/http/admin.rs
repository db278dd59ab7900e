use axum::Json;
use axum::extract::{Query, State};
use lvr_core::model::activity::ProjectionRun;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::{ApiError, blocking};

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RunsResponse {
    ok: bool,
    count: usize,
    runs: Vec<ProjectionRun>,
}

/// Most recent projection runs, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<RunsResponse>, ApiError> {
    let runs = blocking(&state.store, move |store| store.list_runs(query.limit)).await?;
    Ok(Json(RunsResponse {
        ok: true,
        count: runs.len(),
        runs,
    }))
}
