//! Chart time series

use serde::{Deserialize, Serialize};

use crate::SessionCounters;

/// Cumulative counters at a point in the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    pub elapsed_seconds: f64,
    pub focused_seconds: f64,
    pub distracted_seconds: f64,
}

/// Appends at most one sample per whole elapsed second.
///
/// The sampling loop may run at 30 Hz; this keeps the series proportional
/// to session length instead of frame count.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesRecorder {
    samples: Vec<TimeSeriesSample>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the counters at `elapsed` seconds. Returns whether a sample
    /// was appended.
    pub fn record(&mut self, elapsed: f64, counters: &SessionCounters) -> bool {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return false;
        }
        if let Some(last) = self.samples.last() {
            if elapsed.floor() <= last.elapsed_seconds.floor() {
                return false;
            }
        }
        self.samples.push(TimeSeriesSample {
            elapsed_seconds: elapsed,
            focused_seconds: counters.focused_seconds,
            distracted_seconds: counters.distracted_seconds,
        });
        true
    }

    /// Drop all samples
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Independent copy of the series
    pub fn export(&self) -> Vec<TimeSeriesSample> {
        self.samples.clone()
    }

    pub fn last(&self) -> Option<&TimeSeriesSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(focused: f64, distracted: f64) -> SessionCounters {
        SessionCounters {
            focused_seconds: focused,
            distracted_seconds: distracted,
        }
    }

    #[test]
    fn test_one_sample_per_second() {
        let mut recorder = TimeSeriesRecorder::new();

        assert!(recorder.record(0.03, &counters(0.03, 0.0)));
        assert!(!recorder.record(0.5, &counters(0.5, 0.0)));
        assert!(!recorder.record(0.99, &counters(0.99, 0.0)));
        assert!(recorder.record(1.01, &counters(1.01, 0.0)));
        assert!(!recorder.record(1.9, &counters(1.5, 0.4)));
        assert!(recorder.record(3.2, &counters(2.0, 1.2)));

        let series = recorder.export();
        assert_eq!(series.len(), 3);
        assert!(series.windows(2).all(|w| w[0].elapsed_seconds < w[1].elapsed_seconds));
    }

    #[test]
    fn test_export_is_a_copy() {
        let mut recorder = TimeSeriesRecorder::new();
        recorder.record(0.0, &counters(0.0, 0.0));
        let snapshot = recorder.export();
        recorder.record(1.0, &counters(1.0, 0.0));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_reset_and_rejects_bad_elapsed() {
        let mut recorder = TimeSeriesRecorder::new();
        assert!(!recorder.record(-1.0, &counters(0.0, 0.0)));
        assert!(!recorder.record(f64::NAN, &counters(0.0, 0.0)));
        recorder.record(5.0, &counters(5.0, 0.0));
        recorder.reset();
        assert!(recorder.is_empty());
        assert!(recorder.record(0.2, &counters(0.2, 0.0)));
    }
}
