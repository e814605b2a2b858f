//! State guarded by the engine lock

use chrono::{DateTime, Utc};
use countdown::{Countdown, CountdownEvent};
use focus_classifier::{explain, Classification, DistractionReason, TargetSet};
use serde::{Deserialize, Serialize};
use session_metrics::{SessionAccumulator, TimeSeriesRecorder};
use signal_source::PresenceSignal;
use std::time::{Duration, Instant};
use tracing::trace;
use uuid::Uuid;

use crate::snapshot::EngineSnapshot;
use crate::SessionEndReason;

/// Sampling loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    #[default]
    Idle,
    Running,
    Stopping,
}

/// Most recent sampled inputs
#[derive(Debug, Clone)]
pub(crate) struct LatestReading {
    pub signal: PresenceSignal,
    pub title: String,
    pub at: Instant,
}

/// Everything the sampling loop, the countdown ticker, and readers share
#[derive(Debug)]
pub(crate) struct EngineState {
    pub loop_state: LoopState,
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub accumulator: SessionAccumulator,
    pub recorder: TimeSeriesRecorder,
    pub latest: Option<LatestReading>,
    pub countdown: Countdown,
    pub last_error: Option<String>,
}

impl EngineState {
    pub fn new(accumulator: SessionAccumulator, countdown: Countdown) -> Self {
        Self {
            loop_state: LoopState::Idle,
            session_id: None,
            started_at: None,
            accumulator,
            recorder: TimeSeriesRecorder::new(),
            latest: None,
            countdown,
            last_error: None,
        }
    }

    /// Reset accounting for a new session
    pub fn begin_session(
        &mut self,
        targets: TargetSet,
        now: Instant,
    ) -> Result<Uuid, session_metrics::SessionError> {
        self.accumulator.start_session(targets, now)?;
        self.recorder.reset();
        self.latest = None;
        self.last_error = None;

        let id = Uuid::new_v4();
        self.session_id = Some(id);
        self.started_at = Some(Utc::now());
        self.loop_state = LoopState::Running;
        Ok(id)
    }

    /// Classify one sampled reading and account for it
    pub fn apply_reading(
        &mut self,
        signal: PresenceSignal,
        title: String,
        now: Instant,
    ) -> Classification {
        let tracking = self.accumulator.is_running();
        let classification = explain(tracking, &signal, &title, self.accumulator.targets());

        if tracking {
            if let Ok(delta) = self.accumulator.tick(now, classification.state, &title) {
                trace!("tick {:?} +{:.3}s", classification.state, delta);
            }
            let elapsed = self.accumulator.elapsed(now);
            let counters = self.accumulator.snapshot();
            self.recorder.record(elapsed, &counters);
        }

        self.latest = Some(LatestReading {
            signal,
            title,
            at: now,
        });
        classification
    }

    /// Freeze accounting after the loop has released the device
    pub fn end_session(&mut self, reason: &SessionEndReason) {
        let _ = self.accumulator.stop_session();
        self.loop_state = LoopState::Idle;
        match reason {
            SessionEndReason::Requested => {}
            SessionEndReason::DeviceUnavailable { detail } => {
                self.last_error = Some(format!("Capture device unavailable: {}", detail));
            }
            SessionEndReason::WorkerFailed => {
                self.last_error = Some("Sampling worker failed".to_string());
            }
        }
    }

    /// Verdict as of `now`, re-derived from the latest reading
    pub fn current_classification(&self, now: Instant, stale_after: Duration) -> Classification {
        if !self.accumulator.is_running() {
            return Classification::idle();
        }
        match &self.latest {
            Some(reading) if now.saturating_duration_since(reading.at) <= stale_after => explain(
                true,
                &reading.signal,
                &reading.title,
                self.accumulator.targets(),
            ),
            _ => Classification::distracted(DistractionReason::StaleSignal),
        }
    }

    /// One countdown step. Returns the transition and whether the countdown
    /// is still active.
    pub fn countdown_tick(
        &mut self,
        now: Instant,
        stale_after: Duration,
    ) -> (Option<CountdownEvent>, bool) {
        let focused = self
            .current_classification(now, stale_after)
            .state
            .is_focused();
        let event = self.countdown.tick(focused);
        (event, self.countdown.is_active())
    }

    pub fn snapshot(&self, now: Instant, stale_after: Duration) -> EngineSnapshot {
        let counters = self.accumulator.snapshot();
        let classification = self.current_classification(now, stale_after);

        EngineSnapshot {
            session_id: self.session_id,
            started_at: self.started_at,
            loop_state: self.loop_state,
            focused_seconds: counters.focused_seconds,
            distracted_seconds: counters.distracted_seconds,
            focus_ratio: counters.focus_ratio(),
            status: classification.describe(),
            focus_state: classification.state,
            reason: classification.reason,
            active_title: self.latest.as_ref().map(|r| r.title.clone()),
            targets: self.accumulator.targets().names().to_vec(),
            countdown: self.countdown.state(),
            last_error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countdown::CountdownConfig;
    use focus_classifier::FocusState;

    fn state() -> EngineState {
        let countdown = Countdown::new(&CountdownConfig::with_length(Duration::from_secs(5))).unwrap();
        EngineState::new(SessionAccumulator::default(), countdown)
    }

    const STALE: Duration = Duration::from_secs(3);

    #[test]
    fn test_reading_before_session_is_idle() {
        let mut s = state();
        let c = s.apply_reading(PresenceSignal::attentive(), "Editor".into(), Instant::now());
        assert_eq!(c.state, FocusState::Idle);
        assert_eq!(s.accumulator.snapshot().total_seconds(), 0.0);
        assert!(s.recorder.is_empty());
    }

    #[test]
    fn test_begin_session_clears_series_and_latest() {
        let mut s = state();
        let t0 = Instant::now();
        s.begin_session(TargetSet::new(["Editor"]), t0).unwrap();
        s.apply_reading(PresenceSignal::attentive(), "Editor".into(), t0 + Duration::from_secs(1));
        s.end_session(&SessionEndReason::Requested);
        assert_eq!(s.recorder.len(), 1);

        s.begin_session(TargetSet::new(["Editor"]), t0 + Duration::from_secs(2))
            .unwrap();
        assert!(s.recorder.is_empty());
        assert!(s.latest.is_none());
        assert_eq!(s.loop_state, LoopState::Running);
    }

    #[test]
    fn test_stale_reading_is_not_focused() {
        let mut s = state();
        let t0 = Instant::now();
        s.begin_session(TargetSet::new(["Editor"]), t0).unwrap();
        s.apply_reading(PresenceSignal::attentive(), "Editor".into(), t0);

        assert!(s.current_classification(t0 + Duration::from_secs(1), STALE).state.is_focused());
        let stale = s.current_classification(t0 + Duration::from_secs(10), STALE);
        assert_eq!(stale.reason, Some(DistractionReason::StaleSignal));
    }

    #[test]
    fn test_countdown_follows_latest_reading() {
        let mut s = state();
        let t0 = Instant::now();
        s.begin_session(TargetSet::new(["Editor"]), t0).unwrap();
        s.countdown.start(false).unwrap();

        s.apply_reading(PresenceSignal::attentive(), "Editor".into(), t0);
        for _ in 0..3 {
            s.countdown_tick(t0, STALE);
        }
        s.apply_reading(PresenceSignal::attentive(), "Browser".into(), t0);
        for _ in 0..2 {
            s.countdown_tick(t0, STALE);
        }

        let cd = s.countdown.state();
        assert_eq!(cd.remaining_text, "00:02");
        assert!(cd.paused);
    }

    #[test]
    fn test_device_failure_recorded() {
        let mut s = state();
        s.begin_session(TargetSet::new(["Editor"]), Instant::now()).unwrap();
        s.end_session(&SessionEndReason::DeviceUnavailable {
            detail: "gone".into(),
        });
        assert_eq!(s.loop_state, LoopState::Idle);
        assert!(s.last_error.as_deref().unwrap_or_default().contains("gone"));
        assert!(!s.accumulator.is_running());
    }
}
