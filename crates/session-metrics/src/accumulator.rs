//! Session accumulator

use focus_classifier::{AppNameNormalizer, FocusState, TargetSet};
use std::time::Instant;
use tracing::{debug, info};

use crate::ledger::{DistractorEntry, DistractorLedger};
use crate::{SessionCounters, SessionError};

/// Advances focused/distracted counters by real elapsed time.
///
/// Each tick credits the time since the previous tick (or since session
/// start) to exactly one side, so the counters always sum to the tracked
/// wall-clock span.
#[derive(Debug)]
pub struct SessionAccumulator {
    normalizer: AppNameNormalizer,
    counters: SessionCounters,
    ledger: DistractorLedger,
    targets: TargetSet,
    started_at: Option<Instant>,
    last_tick: Option<Instant>,
    running: bool,
}

impl SessionAccumulator {
    /// Create an idle accumulator
    pub fn new(normalizer: AppNameNormalizer) -> Self {
        Self {
            normalizer,
            counters: SessionCounters::default(),
            ledger: DistractorLedger::new(),
            targets: TargetSet::default(),
            started_at: None,
            last_tick: None,
            running: false,
        }
    }

    /// Reset everything and begin accounting from `now`
    pub fn start_session(&mut self, targets: TargetSet, now: Instant) -> Result<(), SessionError> {
        if self.running {
            return Err(SessionError::AlreadyRunning);
        }

        self.counters = SessionCounters::default();
        self.ledger.clear();
        self.targets = targets;
        self.started_at = Some(now);
        self.last_tick = Some(now);
        self.running = true;

        info!("Session accounting started for {} targets", self.targets.len());
        Ok(())
    }

    /// Credit the time since the last tick. Returns the seconds applied.
    pub fn tick(
        &mut self,
        now: Instant,
        state: FocusState,
        active_title: &str,
    ) -> Result<f64, SessionError> {
        if !self.running {
            return Err(SessionError::NotRunning);
        }

        let last = self.last_tick.unwrap_or(now);
        let delta = match now.checked_duration_since(last) {
            Some(d) => d.as_secs_f64(),
            None => {
                debug!("Clock skew: tick is {:?} behind last tick, clamping", last - now);
                0.0
            }
        };

        if state.is_focused() {
            self.counters.focused_seconds += delta;
        } else {
            self.counters.distracted_seconds += delta;
            let bucket = self.normalizer.normalize(active_title);
            self.ledger.add(&bucket, delta);
        }

        // Never move backwards, otherwise the skewed span would be counted twice
        if now > last {
            self.last_tick = Some(now);
        }
        Ok(delta)
    }

    /// Freeze the counters
    pub fn stop_session(&mut self) -> Result<(), SessionError> {
        if !self.running {
            return Err(SessionError::NotRunning);
        }
        self.running = false;
        info!(
            "Session accounting stopped: focused={:.1}s distracted={:.1}s",
            self.counters.focused_seconds, self.counters.distracted_seconds
        );
        Ok(())
    }

    pub fn snapshot(&self) -> SessionCounters {
        self.counters
    }

    pub fn distractor_report(&self) -> Vec<DistractorEntry> {
        self.ledger.report()
    }

    pub fn ledger(&self) -> &DistractorLedger {
        &self.ledger
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds since session start (0.0 before the first session)
    pub fn elapsed(&self, now: Instant) -> f64 {
        self.started_at
            .and_then(|start| now.checked_duration_since(start))
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl Default for SessionAccumulator {
    fn default() -> Self {
        Self::new(AppNameNormalizer::default())
    }
}
