//! Session Metrics
//!
//! Accounting side of a focus session:
//! - Cumulative focused / distracted seconds
//! - Distracted time attributed per application
//! - One chart sample per elapsed second
//!
//! Types here are plain `&mut self` state. Thread safety is provided by the
//! owner (the engine keeps them behind a single lock).

mod accumulator;
mod ledger;
mod recorder;

pub use accumulator::SessionAccumulator;
pub use ledger::{DistractorEntry, DistractorLedger};
pub use recorder::{TimeSeriesRecorder, TimeSeriesSample};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session lifecycle errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session already running")]
    AlreadyRunning,

    #[error("No session running")]
    NotRunning,
}

/// Cumulative time counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub focused_seconds: f64,
    pub distracted_seconds: f64,
}

impl SessionCounters {
    /// Total tracked time
    pub fn total_seconds(&self) -> f64 {
        self.focused_seconds + self.distracted_seconds
    }

    /// Share of tracked time spent focused (0.0 when nothing tracked)
    pub fn focus_ratio(&self) -> f64 {
        let total = self.total_seconds();
        if total > 0.0 {
            self.focused_seconds / total
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_ratio() {
        let counters = SessionCounters {
            focused_seconds: 30.0,
            distracted_seconds: 10.0,
        };
        assert!((counters.focus_ratio() - 0.75).abs() < 1e-9);
        assert_eq!(SessionCounters::default().focus_ratio(), 0.0);
    }
}
