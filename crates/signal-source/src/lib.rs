//! Signal Source Capabilities
//!
//! The focus engine never touches a camera or a window manager directly.
//! It consumes two capabilities:
//! - [`SignalSource`]: opens a capture device and reports, per frame,
//!   whether a subject is present and facing forward
//! - [`WindowInspector`]: reports the display name of the foreground window
//!
//! A scripted implementation of both is provided for demos and tests.

pub mod scripted;
pub mod window;

pub use scripted::{ScriptStep, ScriptedSource, SourceProbe};
pub use window::{ScriptedWindows, WindowInspector};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signal source error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Failed to open capture device: {0}")]
    Open(String),

    #[error("Frame read failed: {0}")]
    Read(String),

    #[error("Frame read timed out")]
    Timeout,

    #[error("Capture device not open")]
    NotOpen,
}

/// Presence classification for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSignal {
    /// A subject was detected in the frame
    pub present: bool,
    /// The subject's head is oriented towards the screen
    pub facing_forward: bool,
}

impl PresenceSignal {
    /// Subject present and facing the screen
    pub fn attentive() -> Self {
        Self {
            present: true,
            facing_forward: true,
        }
    }

    /// Subject present but looking elsewhere
    pub fn looking_away() -> Self {
        Self {
            present: true,
            facing_forward: false,
        }
    }

    /// Nobody in frame
    pub fn absent() -> Self {
        Self::default()
    }

    /// Facing forward only counts when someone is actually there
    pub fn is_attentive(&self) -> bool {
        self.present && self.facing_forward
    }
}

/// A capture device that yields presence signals.
///
/// Implementations wrap blocking device I/O. The engine calls every method
/// from a blocking worker, never while holding its state lock, and guarantees
/// `close` is called exactly once for every successful `open`.
pub trait SignalSource: Send + 'static {
    /// Acquire the device. Must fail fast rather than block indefinitely.
    fn open(&mut self) -> Result<(), SignalError>;

    /// Read and classify one frame.
    fn sample(&mut self) -> Result<PresenceSignal, SignalError>;

    /// Release the device.
    fn close(&mut self);

    /// Whether the device is currently acquired
    fn is_open(&self) -> bool;
}
