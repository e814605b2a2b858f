//! Focus Classifier
//!
//! Turns already-sampled signals into a focus verdict:
//! - Presence and head orientation (from the signal source)
//! - Foreground application matched against the session's target set
//! - Distractor name normalization for attribution
//!
//! Everything here is pure: no device I/O, no clocks, no locks.

pub mod classifier;
pub mod config;
pub mod normalize;
pub mod state;
pub mod targets;

pub use classifier::{classify, explain};
pub use config::ClassifierConfig;
pub use normalize::{AliasRule, AppNameNormalizer, NO_ACTIVE_WINDOW};
pub use state::{Classification, DistractionReason, FocusState};
pub use targets::TargetSet;

use thiserror::Error;

/// Classifier error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// Target list is empty after trimming; every tick will be distracted
    #[error("Invalid target set: {0}")]
    InvalidTargetSet(String),
}
