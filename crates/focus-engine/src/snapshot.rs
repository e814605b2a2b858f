//! Read-only views and control surface for presentation layers

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use countdown::CountdownState;
use focus_classifier::{DistractionReason, FocusState};
use serde::{Deserialize, Serialize};
use session_metrics::{DistractorEntry, TimeSeriesSample};
use uuid::Uuid;

use crate::engine::StartOutcome;
use crate::state::LoopState;
use crate::EngineError;

/// Consistent point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub loop_state: LoopState,
    pub focused_seconds: f64,
    pub distracted_seconds: f64,
    /// focused / (focused + distracted), 0 before any time is accounted
    pub focus_ratio: f64,
    pub focus_state: FocusState,
    pub reason: Option<DistractionReason>,
    /// Human readable status line
    pub status: String,
    pub active_title: Option<String>,
    pub targets: Vec<String>,
    pub countdown: CountdownState,
    pub last_error: Option<String>,
}

impl EngineSnapshot {
    pub fn is_running(&self) -> bool {
        self.loop_state == LoopState::Running
    }
}

/// Read side of the engine
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self) -> EngineSnapshot;

    /// Distractors, largest first
    fn distractor_report(&self) -> Vec<DistractorEntry>;

    /// One sample per whole elapsed second
    fn time_series(&self) -> Vec<TimeSeriesSample>;

    /// Open window titles to offer as targets
    fn window_titles(&self) -> Vec<String>;
}

/// Control side of the engine
#[async_trait]
pub trait SessionController: Send + Sync {
    async fn start_session(&self, targets: Vec<String>) -> Result<StartOutcome, EngineError>;

    async fn stop_session(&self) -> Result<EngineSnapshot, EngineError>;

    async fn start_countdown(&self) -> Result<CountdownState, EngineError>;

    async fn pause_countdown(&self) -> Result<CountdownState, EngineError>;

    async fn resume_countdown(&self) -> Result<CountdownState, EngineError>;

    async fn reset_countdown(&self) -> Result<CountdownState, EngineError>;
}
