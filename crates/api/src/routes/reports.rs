//! Report Routes

use axum::{
    extract::{Query, State},
    Json,
};
use focus_engine::{DistractorEntry, TimeSeriesSample};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

/// Query parameters for the distractor report
#[derive(Debug, Deserialize)]
pub struct DistractorQuery {
    /// Maximum number of entries, largest first
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for the distractor report
#[derive(Debug, Serialize)]
pub struct DistractorResponse {
    pub data: Vec<DistractorEntry>,
    pub count: usize,
    /// Sum over all entries, including those cut by `limit`
    pub total_seconds: f64,
}

/// Distracted time per application
pub async fn get_distractors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DistractorQuery>,
) -> Json<DistractorResponse> {
    let mut data = state.provider.distractor_report();
    let total_seconds = data.iter().map(|e| e.seconds).sum();
    data.truncate(params.limit.min(1000));

    Json(DistractorResponse {
        count: data.len(),
        total_seconds,
        data,
    })
}

/// Response for the time series
#[derive(Debug, Serialize)]
pub struct TimeSeriesResponse {
    pub data: Vec<TimeSeriesSample>,
    pub count: usize,
}

/// Cumulative counters, one sample per elapsed second
pub async fn get_timeseries(State(state): State<Arc<AppState>>) -> Json<TimeSeriesResponse> {
    let data = state.provider.time_series();
    Json(TimeSeriesResponse {
        count: data.len(),
        data,
    })
}

/// Response for the window list
#[derive(Debug, Serialize)]
pub struct WindowsResponse {
    pub data: Vec<String>,
    pub count: usize,
}

/// Open windows that can be chosen as targets
pub async fn get_windows(State(state): State<Arc<AppState>>) -> Json<WindowsResponse> {
    let data = state.provider.window_titles();
    Json(WindowsResponse {
        count: data.len(),
        data,
    })
}
