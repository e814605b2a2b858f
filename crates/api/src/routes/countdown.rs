//! Countdown Routes

use axum::{extract::State, Json};
use focus_engine::CountdownState;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

pub async fn start(State(state): State<Arc<AppState>>) -> Result<Json<CountdownState>, ApiError> {
    Ok(Json(state.controller.start_countdown().await?))
}

pub async fn pause(State(state): State<Arc<AppState>>) -> Result<Json<CountdownState>, ApiError> {
    Ok(Json(state.controller.pause_countdown().await?))
}

pub async fn resume(State(state): State<Arc<AppState>>) -> Result<Json<CountdownState>, ApiError> {
    Ok(Json(state.controller.resume_countdown().await?))
}

pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<CountdownState>, ApiError> {
    Ok(Json(state.controller.reset_countdown().await?))
}
