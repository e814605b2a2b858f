//! Focus Engine
//!
//! Ties the pieces together:
//! - Sampling loop: reads presence + foreground window, classifies, and
//!   accounts elapsed time (one background task per session)
//! - Countdown ticker: advances the work-session clock once per second,
//!   only while the latest verdict is `Focused`
//! - Snapshot API: consistent read-only views for any presentation layer
//!
//! All mutable session state sits behind one lock inside [`FocusEngine`].

pub mod config;
pub mod engine;
pub mod sampler;
pub mod snapshot;
mod state;
mod ticker;

pub use config::EngineConfig;
pub use engine::{FocusEngine, StartOutcome};
pub use sampler::SamplerConfig;
pub use snapshot::{EngineSnapshot, SessionController, SnapshotProvider};
pub use state::LoopState;

pub use countdown::{CountdownConfig, CountdownState};
pub use focus_classifier::{ClassifierConfig, DistractionReason, FocusState, TargetSet};
pub use session_metrics::{DistractorEntry, SessionCounters, TimeSeriesSample};

use countdown::CountdownError;
use serde::{Deserialize, Serialize};
use session_metrics::SessionError;
use signal_source::SignalError;
use thiserror::Error;
use uuid::Uuid;

/// Engine error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Capture device could not be opened or kept failing
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Already running")]
    AlreadyRunning,

    #[error("Not running")]
    NotRunning,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<SessionError> for EngineError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AlreadyRunning => EngineError::AlreadyRunning,
            SessionError::NotRunning => EngineError::NotRunning,
        }
    }
}

impl From<CountdownError> for EngineError {
    fn from(err: CountdownError) -> Self {
        match err {
            CountdownError::AlreadyRunning => EngineError::AlreadyRunning,
            CountdownError::NotRunning => EngineError::NotRunning,
            CountdownError::InvalidLength(msg) | CountdownError::InvalidConfig(msg) => {
                EngineError::InvalidConfig(msg)
            }
        }
    }
}

impl From<SignalError> for EngineError {
    fn from(err: SignalError) -> Self {
        EngineError::DeviceUnavailable(err.to_string())
    }
}

/// Why a sampling session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEndReason {
    /// Explicit stop request
    Requested,
    /// Repeated read failures
    DeviceUnavailable { detail: String },
    /// Sampling task died unexpectedly
    WorkerFailed,
}

/// Notifications for presentation layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    SessionStarted {
        session_id: Uuid,
    },
    SessionEnded {
        session_id: Option<Uuid>,
        reason: SessionEndReason,
    },
    CountdownPaused,
    CountdownResumed,
    CountdownCompleted {
        completed_sessions: u32,
    },
}
