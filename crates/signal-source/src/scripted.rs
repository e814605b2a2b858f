//! Scripted signal source
//!
//! Replays a fixed list of frame outcomes. Stands in for a real camera in
//! the demo binary and in engine tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::{PresenceSignal, SignalError, SignalSource};

/// One scripted frame outcome
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Successful read returning this signal
    Frame(PresenceSignal),
    /// Failed read
    Fail,
    /// Block for the given time, then return the signal
    Stall(Duration, PresenceSignal),
}

/// Shared counters for observing device lifecycle from outside
#[derive(Debug, Clone, Default)]
pub struct SourceProbe {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl SourceProbe {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

/// Signal source replaying a script
#[derive(Debug)]
pub struct ScriptedSource {
    script: VecDeque<ScriptStep>,
    original: Vec<ScriptStep>,
    cycle: bool,
    fail_open: bool,
    open_delay: Option<Duration>,
    open: bool,
    last: PresenceSignal,
    probe: SourceProbe,
}

impl ScriptedSource {
    /// Play the steps once, then keep returning the last successful frame
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            script: steps.iter().cloned().collect(),
            original: steps,
            cycle: false,
            fail_open: false,
            open_delay: None,
            open: false,
            last: PresenceSignal::absent(),
            probe: SourceProbe::default(),
        }
    }

    /// Play the steps in a loop forever
    pub fn cycle(steps: Vec<ScriptStep>) -> Self {
        Self {
            cycle: true,
            ..Self::new(steps)
        }
    }

    /// Always report the same signal
    pub fn steady(signal: PresenceSignal) -> Self {
        Self::new(vec![ScriptStep::Frame(signal)])
    }

    /// Make `open` fail, simulating a missing device
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Block the first `open` for `wait`, simulating a slow driver
    pub fn slow_first_open(mut self, wait: Duration) -> Self {
        self.open_delay = Some(wait);
        self
    }

    /// Handle for observing opens, closes, and reads
    pub fn probe(&self) -> SourceProbe {
        self.probe.clone()
    }

    fn next_step(&mut self) -> Option<ScriptStep> {
        if self.script.is_empty() && self.cycle && !self.original.is_empty() {
            self.script = self.original.iter().cloned().collect();
        }
        self.script.pop_front()
    }
}

impl SignalSource for ScriptedSource {
    fn open(&mut self) -> Result<(), SignalError> {
        if self.fail_open {
            return Err(SignalError::Open("scripted device refused to open".into()));
        }
        if let Some(wait) = self.open_delay.take() {
            debug!("Scripted source opening slowly ({:?})", wait);
            std::thread::sleep(wait);
        }
        self.open = true;
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        info!("Scripted source opened ({} steps)", self.original.len());
        Ok(())
    }

    fn sample(&mut self) -> Result<PresenceSignal, SignalError> {
        if !self.open {
            return Err(SignalError::NotOpen);
        }
        self.probe.reads.fetch_add(1, Ordering::SeqCst);

        match self.next_step() {
            Some(ScriptStep::Frame(signal)) => {
                self.last = signal;
                Ok(signal)
            }
            Some(ScriptStep::Fail) => Err(SignalError::Read("scripted failure".into())),
            Some(ScriptStep::Stall(wait, signal)) => {
                debug!("Scripted source stalling for {:?}", wait);
                std::thread::sleep(wait);
                self.last = signal;
                Ok(signal)
            }
            None => Ok(self.last),
        }
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.probe.closes.fetch_add(1, Ordering::SeqCst);
            info!("Scripted source closed");
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
