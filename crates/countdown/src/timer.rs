//! Countdown state machine

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::CountdownError;

const STEP: Duration = Duration::from_secs(1);

/// Countdown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Length of one work session (seconds, default 25 minutes)
    pub session_length_secs: u64,

    /// Real time between ticks (milliseconds). Each tick removes one
    /// second of remaining time; only tests shorten this.
    pub tick_interval_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            session_length_secs: 25 * 60,
            tick_interval_ms: 1000,
        }
    }
}

impl CountdownConfig {
    pub fn with_length(session_length: Duration) -> Self {
        Self {
            session_length_secs: session_length.as_secs(),
            ..Default::default()
        }
    }

    pub fn session_length(&self) -> Duration {
        Duration::from_secs(self.session_length_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), CountdownError> {
        if self.session_length_secs == 0 {
            return Err(CountdownError::InvalidLength(
                "session length must be at least one second".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(CountdownError::InvalidConfig(
                "tick interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPhase {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Transition reported by [`Countdown::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CountdownEvent {
    Paused,
    Resumed,
    Completed { completed_sessions: u32 },
}

/// Read-only view for presentation layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownState {
    pub phase: CountdownPhase,
    pub remaining_seconds: u64,
    /// `mm:ss`
    pub remaining_text: String,
    /// Active (running or paused)
    pub running: bool,
    pub paused: bool,
    /// Paused by the user rather than by lost focus
    pub manual_pause: bool,
    pub completed_session_count: u32,
}

/// Focus-gated countdown
#[derive(Debug, Clone)]
pub struct Countdown {
    length: Duration,
    remaining: Duration,
    phase: CountdownPhase,
    manual_pause: bool,
    completed: u32,
}

impl Countdown {
    pub fn new(config: &CountdownConfig) -> Result<Self, CountdownError> {
        config.validate()?;
        let length = config.session_length();
        Ok(Self {
            length,
            remaining: length,
            phase: CountdownPhase::Idle,
            manual_pause: false,
            completed: 0,
        })
    }

    /// Idle -> Running, or Paused when `focused` is false
    pub fn start(&mut self, focused: bool) -> Result<(), CountdownError> {
        if self.is_active() {
            return Err(CountdownError::AlreadyRunning);
        }
        self.manual_pause = false;
        self.phase = self.active_phase(focused);
        info!(
            "Countdown started at {} ({:?})",
            format_mmss(self.remaining),
            self.phase
        );
        Ok(())
    }

    /// Sticky pause; holds until [`Countdown::resume`]
    pub fn pause(&mut self) -> Result<(), CountdownError> {
        if !self.is_active() {
            return Err(CountdownError::NotRunning);
        }
        self.manual_pause = true;
        self.phase = CountdownPhase::Paused;
        debug!("Countdown paused manually");
        Ok(())
    }

    /// Lift a manual pause. Stays paused while `focused` is false.
    pub fn resume(&mut self, focused: bool) -> Result<(), CountdownError> {
        if !self.is_active() {
            return Err(CountdownError::NotRunning);
        }
        self.manual_pause = false;
        self.phase = self.active_phase(focused);
        debug!("Countdown resumed manually ({:?})", self.phase);
        Ok(())
    }

    /// Stop and restore the full length
    pub fn reset(&mut self) {
        self.phase = CountdownPhase::Idle;
        self.remaining = self.length;
        self.manual_pause = false;
    }

    /// Advance by one tick given the current focus verdict
    pub fn tick(&mut self, focused: bool) -> Option<CountdownEvent> {
        if !self.is_active() {
            return None;
        }

        if self.manual_pause || !focused {
            let was_running = self.phase == CountdownPhase::Running;
            self.phase = CountdownPhase::Paused;
            return was_running.then_some(CountdownEvent::Paused);
        }

        let was_paused = self.phase == CountdownPhase::Paused;
        self.phase = CountdownPhase::Running;
        self.remaining = self.remaining.saturating_sub(STEP);

        if self.remaining.is_zero() {
            self.completed += 1;
            self.reset();
            info!("Countdown completed (total sessions: {})", self.completed);
            return Some(CountdownEvent::Completed {
                completed_sessions: self.completed,
            });
        }

        was_paused.then_some(CountdownEvent::Resumed)
    }

    fn active_phase(&self, focused: bool) -> CountdownPhase {
        if focused && !self.manual_pause {
            CountdownPhase::Running
        } else {
            CountdownPhase::Paused
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != CountdownPhase::Idle
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed
    }

    pub fn state(&self) -> CountdownState {
        CountdownState {
            phase: self.phase,
            remaining_seconds: self.remaining.as_secs(),
            remaining_text: format_mmss(self.remaining),
            running: self.is_active(),
            paused: self.phase == CountdownPhase::Paused,
            manual_pause: self.manual_pause,
            completed_session_count: self.completed,
        }
    }
}

fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn countdown(secs: u64) -> Countdown {
        Countdown::new(&CountdownConfig::with_length(Duration::from_secs(secs))).unwrap()
    }

    #[test]
    fn test_default_is_25_minutes() {
        let c = Countdown::new(&CountdownConfig::default()).unwrap();
        assert_eq!(c.state().remaining_text, "25:00");
        assert_eq!(c.phase(), CountdownPhase::Idle);
    }

    #[test]
    fn test_pauses_on_distraction() {
        let mut c = countdown(5);
        c.start(true).unwrap();

        for _ in 0..3 {
            c.tick(true);
        }
        assert_eq!(c.tick(false), Some(CountdownEvent::Paused));
        assert_eq!(c.tick(false), None);

        let state = c.state();
        assert_eq!(state.remaining_text, "00:02");
        assert!(state.paused);
        assert!(state.running);
    }

    #[test]
    fn test_resumes_within_one_tick() {
        let mut c = countdown(10);
        c.start(true).unwrap();
        c.tick(false);
        assert_eq!(c.remaining(), Duration::from_secs(10));

        assert_eq!(c.tick(true), Some(CountdownEvent::Resumed));
        assert_eq!(c.remaining(), Duration::from_secs(9));
    }

    #[test]
    fn test_completion_counts_once_and_resets() {
        let mut c = countdown(3);
        c.start(true).unwrap();

        assert_eq!(c.tick(true), None);
        assert_eq!(c.tick(true), None);
        assert_eq!(
            c.tick(true),
            Some(CountdownEvent::Completed {
                completed_sessions: 1
            })
        );
        assert_eq!(c.phase(), CountdownPhase::Idle);
        assert_eq!(c.remaining(), Duration::from_secs(3));

        // Idle countdown ignores further ticks
        assert_eq!(c.tick(true), None);
        assert_eq!(c.completed_sessions(), 1);
    }

    #[test]
    fn test_manual_pause_is_sticky() {
        let mut c = countdown(10);
        c.start(true).unwrap();
        c.pause().unwrap();

        c.tick(true);
        c.tick(true);
        assert_eq!(c.remaining(), Duration::from_secs(10));
        assert!(c.state().manual_pause);

        c.resume(true).unwrap();
        c.tick(true);
        assert_eq!(c.remaining(), Duration::from_secs(9));

        // Lost focus still pauses after a manual resume
        c.tick(false);
        assert_eq!(c.phase(), CountdownPhase::Paused);
        assert!(!c.state().manual_pause);
    }

    #[test]
    fn test_lifecycle_misuse() {
        let mut c = countdown(10);
        assert_eq!(c.pause(), Err(CountdownError::NotRunning));
        assert_eq!(c.resume(true), Err(CountdownError::NotRunning));
        c.start(true).unwrap();
        assert_eq!(c.start(true), Err(CountdownError::AlreadyRunning));
    }

    #[test]
    fn test_reset_restores_length() {
        let mut c = countdown(10);
        c.start(true).unwrap();
        c.tick(true);
        c.pause().unwrap();
        c.reset();

        let state = c.state();
        assert_eq!(state.remaining_seconds, 10);
        assert!(!state.running);
        assert!(!state.paused);
        assert!(!state.manual_pause);
    }

    #[test]
    fn test_start_while_distracted_is_paused() {
        let mut c = countdown(10);
        c.start(false).unwrap();

        let state = c.state();
        assert_eq!(state.phase, CountdownPhase::Paused);
        assert!(state.running);
        assert!(state.paused);
        assert!(!state.manual_pause);

        assert_eq!(c.tick(true), Some(CountdownEvent::Resumed));
        assert_eq!(c.remaining(), Duration::from_secs(9));
    }

    #[test]
    fn test_resume_while_distracted_stays_paused() {
        let mut c = countdown(10);
        c.start(true).unwrap();
        c.pause().unwrap();
        c.resume(false).unwrap();

        let state = c.state();
        assert!(state.paused);
        assert!(!state.manual_pause);
        assert_eq!(c.tick(false), None);
        assert_eq!(c.remaining(), Duration::from_secs(10));
    }

    #[test]
    fn test_zero_tick_interval_names_config() {
        let config = CountdownConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CountdownError::InvalidConfig(msg)) if msg.contains("tick interval")
        ));
    }

    #[test]
    fn test_zero_length_rejected() {
        let config = CountdownConfig {
            session_length_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            Countdown::new(&config),
            Err(CountdownError::InvalidLength(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_decrements_only_when_focused(focus in prop::collection::vec(any::<bool>(), 0..50)) {
            let mut c = countdown(1000);
            c.start(true).unwrap();
            for f in &focus {
                c.tick(*f);
            }
            let focused_ticks = focus.iter().filter(|f| **f).count() as u64;
            prop_assert_eq!(c.remaining().as_secs(), 1000 - focused_ticks);
        }
    }
}
