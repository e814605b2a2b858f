//! Engine handle and session lifecycle

use async_trait::async_trait;
use countdown::{Countdown, CountdownState};
use focus_classifier::TargetSet;
use serde::{Deserialize, Serialize};
use session_metrics::{DistractorEntry, SessionAccumulator, TimeSeriesSample};
use signal_source::{SignalSource, WindowInspector};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::sampler::{
    close_source, finish_session, lock_state, open_source, sampling_loop, SamplerContext,
    SharedSource,
};
use crate::snapshot::{EngineSnapshot, SessionController, SnapshotProvider};
use crate::state::{EngineState, LoopState};
use crate::ticker::countdown_ticker;
use crate::{EngineError, EngineEvent, SessionEndReason};

/// Result of a successful [`FocusEngine::start_session`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub session_id: Uuid,
    /// Targets after trimming and de-duplication
    pub targets: Vec<String>,
    /// Set when the session started with an unusable target set
    pub warning: Option<String>,
}

struct TaskHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
    session_id: Option<Uuid>,
}

#[derive(Default)]
struct SamplerSlot {
    task: Option<TaskHandle>,
    /// Closes a device whose open finished after its timeout
    release: Option<JoinHandle<()>>,
}

/// Focus tracking engine.
///
/// Owns the capture device, the foreground-window inspector, and all
/// session state. Share it behind an `Arc`; every method takes `&self`.
pub struct FocusEngine {
    config: EngineConfig,
    state: Arc<Mutex<EngineState>>,
    source: SharedSource,
    windows: Arc<dyn WindowInspector>,
    sampler: tokio::sync::Mutex<SamplerSlot>,
    ticker: tokio::sync::Mutex<Option<TaskHandle>>,
    events: broadcast::Sender<EngineEvent>,
}

impl FocusEngine {
    pub fn new(
        config: EngineConfig,
        source: impl SignalSource,
        windows: impl WindowInspector,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let accumulator = SessionAccumulator::new(config.classifier.normalizer());
        let countdown = Countdown::new(&config.countdown)?;
        let (events, _) = broadcast::channel(config.event_capacity);
        let source: Box<dyn SignalSource> = Box::new(source);

        info!(
            "Focus engine ready (sampling {:.1} Hz, countdown {}s)",
            config.sampler.max_rate_hz, config.countdown.session_length_secs
        );

        Ok(Self {
            state: Arc::new(Mutex::new(EngineState::new(accumulator, countdown))),
            source: Arc::new(Mutex::new(source)),
            windows: Arc::new(windows),
            sampler: tokio::sync::Mutex::new(SamplerSlot::default()),
            ticker: tokio::sync::Mutex::new(None),
            events,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Receive lifecycle and countdown notifications
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Open the device and start sampling against `targets`
    pub async fn start_session(&self, targets: Vec<String>) -> Result<StartOutcome, EngineError> {
        let mut slot = self.sampler.lock().await;
        self.reap_sampler(&mut slot).await;
        if slot.task.is_some() || lock_state(&self.state).loop_state != LoopState::Idle {
            return Err(EngineError::AlreadyRunning);
        }

        let targets = TargetSet::new(targets);
        let warning = match targets.validate() {
            Ok(()) => None,
            Err(e) => {
                warn!("Starting session anyway: {}", e);
                Some(e.to_string())
            }
        };

        let opened = match self.await_release(&mut slot).await {
            Ok(()) => {
                open_source(
                    &self.source,
                    self.config.sampler.open_timeout(),
                    &mut slot.release,
                )
                .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = opened {
            error!("Cannot start session: {}", e);
            let mut state = lock_state(&self.state);
            state.loop_state = LoopState::Idle;
            state.last_error = Some(e.to_string());
            return Err(e);
        }

        let begun = lock_state(&self.state).begin_session(targets.clone(), Instant::now());
        let session_id = match begun {
            Ok(id) => id,
            Err(e) => {
                close_source(&self.source, self.config.sampler.open_timeout()).await;
                return Err(e.into());
            }
        };

        let cancel = CancellationToken::new();
        let ctx = SamplerContext {
            state: Arc::clone(&self.state),
            source: Arc::clone(&self.source),
            windows: Arc::clone(&self.windows),
            events: self.events.clone(),
            config: self.config.sampler.clone(),
        };
        let join = tokio::spawn(sampling_loop(ctx, session_id, cancel.clone()));
        slot.task = Some(TaskHandle {
            cancel,
            join,
            session_id: Some(session_id),
        });

        metrics::counter!("focus_sessions_started_total").increment(1);
        info!(
            "Session {} started with targets {:?}",
            session_id,
            targets.names()
        );
        let _ = self.events.send(EngineEvent::SessionStarted { session_id });

        Ok(StartOutcome {
            session_id,
            targets: targets.names().to_vec(),
            warning,
        })
    }

    /// Stop sampling and wait until the device is released.
    ///
    /// If the device is still busy after the stop timeout the snapshot
    /// reports `Stopping`; the session ends once the release completes and
    /// no new session can start before then.
    pub async fn stop_session(&self) -> Result<EngineSnapshot, EngineError> {
        let mut slot = self.sampler.lock().await;
        let mut handle = slot.task.take().ok_or(EngineError::NotRunning)?;

        if handle.join.is_finished() {
            if handle.cancel.is_cancelled() {
                // Release finished after an earlier stop gave up waiting
                self.join_sampler(handle).await;
                return Ok(self.snapshot());
            }
            // Loop already ended on its own (device failure)
            self.join_sampler(handle).await;
            return Err(EngineError::NotRunning);
        }

        if !handle.cancel.is_cancelled() {
            lock_state(&self.state).loop_state = LoopState::Stopping;
            handle.cancel.cancel();
        }

        let limit = self.config.sampler.stop_timeout();
        match tokio::time::timeout(limit, &mut handle.join).await {
            Ok(joined) => self.after_join(joined, handle.session_id).await,
            Err(_) => {
                warn!("Capture device still busy after {:?}, session stays stopping", limit);
                slot.task = Some(handle);
            }
        }
        Ok(self.snapshot())
    }

    pub async fn start_countdown(&self) -> Result<CountdownState, EngineError> {
        let mut slot = self.ticker.lock().await;
        let state = {
            let mut state = lock_state(&self.state);
            let focused = self.focused_now(&state);
            state.countdown.start(focused)?;
            state.countdown.state()
        };

        if let Some(old) = slot.take() {
            old.cancel.cancel();
            let _ = old.join.await;
        }

        let cancel = CancellationToken::new();
        let join = tokio::spawn(countdown_ticker(
            Arc::clone(&self.state),
            self.events.clone(),
            self.config.countdown.tick_interval(),
            self.config.stale_after(),
            cancel.clone(),
        ));
        *slot = Some(TaskHandle {
            cancel,
            join,
            session_id: None,
        });
        Ok(state)
    }

    pub async fn pause_countdown(&self) -> Result<CountdownState, EngineError> {
        let state = {
            let mut state = lock_state(&self.state);
            state.countdown.pause()?;
            state.countdown.state()
        };
        let _ = self.events.send(EngineEvent::CountdownPaused);
        Ok(state)
    }

    pub async fn resume_countdown(&self) -> Result<CountdownState, EngineError> {
        let state = {
            let mut state = lock_state(&self.state);
            let focused = self.focused_now(&state);
            state.countdown.resume(focused)?;
            state.countdown.state()
        };
        // Otherwise the ticker announces it once focus returns
        if !state.paused {
            let _ = self.events.send(EngineEvent::CountdownResumed);
        }
        Ok(state)
    }

    pub async fn reset_countdown(&self) -> Result<CountdownState, EngineError> {
        let mut slot = self.ticker.lock().await;
        if let Some(old) = slot.take() {
            old.cancel.cancel();
            let _ = old.join.await;
        }
        let mut state = lock_state(&self.state);
        state.countdown.reset();
        Ok(state.countdown.state())
    }

    /// Stop everything. Safe to call more than once.
    pub async fn shutdown(&self) {
        match self.stop_session().await {
            Ok(_) | Err(EngineError::NotRunning) => {}
            Err(e) => warn!("Shutdown stop failed: {}", e),
        }
        let _ = self.reset_countdown().await;
        info!("Focus engine shut down");
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        lock_state(&self.state).snapshot(Instant::now(), self.config.stale_after())
    }

    pub fn distractor_report(&self) -> Vec<DistractorEntry> {
        lock_state(&self.state).accumulator.distractor_report()
    }

    pub fn time_series(&self) -> Vec<TimeSeriesSample> {
        lock_state(&self.state).recorder.export()
    }

    pub fn window_titles(&self) -> Vec<String> {
        self.windows.list_titles()
    }

    fn focused_now(&self, state: &EngineState) -> bool {
        state
            .current_classification(Instant::now(), self.config.stale_after())
            .state
            .is_focused()
    }

    /// Drop a sampler handle whose loop has already exited
    async fn reap_sampler(&self, slot: &mut SamplerSlot) {
        if slot.task.as_ref().is_some_and(|h| h.join.is_finished()) {
            if let Some(handle) = slot.task.take() {
                self.join_sampler(handle).await;
            }
        }
    }

    /// Wait out the close of a device that opened after its timeout
    async fn await_release(&self, slot: &mut SamplerSlot) -> Result<(), EngineError> {
        let Some(mut release) = slot.release.take() else {
            return Ok(());
        };
        let limit = self.config.sampler.open_timeout();
        match tokio::time::timeout(limit, &mut release).await {
            Ok(_) => Ok(()),
            Err(_) => {
                slot.release = Some(release);
                Err(EngineError::DeviceUnavailable(format!(
                    "previous device release still pending after {:?}",
                    limit
                )))
            }
        }
    }

    async fn join_sampler(&self, handle: TaskHandle) {
        let joined = handle.join.await;
        self.after_join(joined, handle.session_id).await;
    }

    /// Clean up after a loop that died instead of returning
    async fn after_join(&self, joined: Result<(), JoinError>, session_id: Option<Uuid>) {
        if let Err(e) = joined {
            error!("Sampling task failed: {}", e);
            close_source(&self.source, self.config.sampler.open_timeout()).await;
            if let Some(session_id) = session_id {
                finish_session(
                    &self.state,
                    &self.events,
                    session_id,
                    SessionEndReason::WorkerFailed,
                );
            }
        }
    }
}

impl Drop for FocusEngine {
    fn drop(&mut self) {
        // Loops release the device themselves once cancelled
        let sampler = self.sampler.get_mut().task.as_ref();
        let ticker = self.ticker.get_mut().as_ref();
        for handle in [sampler, ticker].into_iter().flatten() {
            handle.cancel.cancel();
        }
    }
}

impl SnapshotProvider for FocusEngine {
    fn snapshot(&self) -> EngineSnapshot {
        FocusEngine::snapshot(self)
    }

    fn distractor_report(&self) -> Vec<DistractorEntry> {
        FocusEngine::distractor_report(self)
    }

    fn time_series(&self) -> Vec<TimeSeriesSample> {
        FocusEngine::time_series(self)
    }

    fn window_titles(&self) -> Vec<String> {
        FocusEngine::window_titles(self)
    }
}

#[async_trait]
impl SessionController for FocusEngine {
    async fn start_session(&self, targets: Vec<String>) -> Result<StartOutcome, EngineError> {
        FocusEngine::start_session(self, targets).await
    }

    async fn stop_session(&self) -> Result<EngineSnapshot, EngineError> {
        FocusEngine::stop_session(self).await
    }

    async fn start_countdown(&self) -> Result<CountdownState, EngineError> {
        FocusEngine::start_countdown(self).await
    }

    async fn pause_countdown(&self) -> Result<CountdownState, EngineError> {
        FocusEngine::pause_countdown(self).await
    }

    async fn resume_countdown(&self) -> Result<CountdownState, EngineError> {
        FocusEngine::resume_countdown(self).await
    }

    async fn reset_countdown(&self) -> Result<CountdownState, EngineError> {
        FocusEngine::reset_countdown(self).await
    }
}
