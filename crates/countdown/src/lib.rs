//! Work-Session Countdown
//!
//! A countdown that only advances while the user is focused.
//! The owner drives it with one [`Countdown::tick`] per second, passing the
//! current focus verdict. `start` and `resume` take the verdict too, so the
//! phase is never `Running` while the user is not focused.

mod timer;

pub use timer::{Countdown, CountdownConfig, CountdownEvent, CountdownPhase, CountdownState};

use thiserror::Error;

/// Countdown errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CountdownError {
    #[error("Countdown already running")]
    AlreadyRunning,

    #[error("Countdown not running")]
    NotRunning,

    #[error("Invalid session length: {0}")]
    InvalidLength(String),

    #[error("Invalid countdown configuration: {0}")]
    InvalidConfig(String),
}
