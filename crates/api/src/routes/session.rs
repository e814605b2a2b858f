//! Session Routes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use focus_engine::{EngineSnapshot, StartOutcome};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// Body for `POST /api/v1/session/start`
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    /// Window titles that count as focused work
    pub targets: Vec<String>,
}

/// Current session snapshot
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<EngineSnapshot> {
    Json(state.provider.snapshot())
}

/// Start a session against the requested targets
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<StartOutcome>, ApiError> {
    let Json(request) = payload.map_err(|rej| ApiError::BadRequest(rej.body_text()))?;
    info!("Session start requested for {:?}", request.targets);
    let outcome = state.controller.start_session(request.targets).await?;
    Ok(Json(outcome))
}

/// Stop the running session; returns the frozen snapshot
pub async fn stop_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    let snapshot = state.controller.stop_session().await?;
    info!(
        "Session stopped: {:.1}s focused, {:.1}s distracted",
        snapshot.focused_seconds, snapshot.distracted_seconds
    );
    Ok(Json(snapshot))
}
