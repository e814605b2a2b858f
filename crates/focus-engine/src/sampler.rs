//! Sampling loop
//!
//! One background task per session. Each tick reads a presence signal and
//! the foreground window title on a blocking worker, then classifies and
//! accounts the reading under the engine lock. The device is released
//! exactly once when the loop exits, whatever the exit path, and the session
//! only ends after that release has finished.

use serde::{Deserialize, Serialize};
use signal_source::{PresenceSignal, SignalError, SignalSource, WindowInspector};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::state::{EngineState, LoopState};
use crate::{EngineError, EngineEvent, SessionEndReason};

/// Capture device shared between the engine and its blocking workers
pub(crate) type SharedSource = Arc<Mutex<Box<dyn SignalSource>>>;

/// Sampling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Upper bound on readings per second
    pub max_rate_hz: f64,

    /// A read attempt that yields no frame within this long counts as one
    /// failure (milliseconds). A read still stuck in the device is waited on
    /// again by the next attempt instead of being replaced.
    pub read_timeout_ms: u64,

    /// Give up on opening the device after this long (milliseconds)
    pub open_timeout_ms: u64,

    /// Consecutive failed reads before the session is ended
    pub max_consecutive_failures: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_rate_hz: 30.0,
            read_timeout_ms: 1000,
            open_timeout_ms: 3000,
            max_consecutive_failures: 3,
        }
    }
}

impl SamplerConfig {
    /// Minimum spacing between readings
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.max_rate_hz)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// How long a stop request waits for the device to be released before
    /// reporting the session as still stopping
    pub fn stop_timeout(&self) -> Duration {
        self.open_timeout() + self.read_timeout()
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.max_rate_hz.is_finite() || self.max_rate_hz <= 0.0 || self.max_rate_hz > 1000.0 {
            return Err(EngineError::InvalidConfig(format!(
                "max_rate_hz must be in (0, 1000], got {}",
                self.max_rate_hz
            )));
        }
        if self.read_timeout_ms == 0 || self.open_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "sampler timeouts must be positive".into(),
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(EngineError::InvalidConfig(
                "max_consecutive_failures must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Lock the engine state, recovering from a poisoned lock
pub(crate) fn lock_state(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_source(source: &Mutex<Box<dyn SignalSource>>) -> MutexGuard<'_, Box<dyn SignalSource>> {
    source.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Acquire the capture device on a blocking worker.
///
/// On timeout the open keeps running in the background; a task that closes
/// the device again once it finishes is left in `release`.
pub(crate) async fn open_source(
    source: &SharedSource,
    limit: Duration,
    release: &mut Option<JoinHandle<()>>,
) -> Result<(), EngineError> {
    let mut handle = tokio::task::spawn_blocking({
        let source = Arc::clone(source);
        move || lock_source(&source).open()
    });

    match tokio::time::timeout(limit, &mut handle).await {
        Ok(Ok(result)) => result.map_err(EngineError::from),
        Ok(Err(join_err)) => Err(EngineError::DeviceUnavailable(format!(
            "open worker failed: {}",
            join_err
        ))),
        Err(_) => {
            let source = Arc::clone(source);
            *release = Some(tokio::spawn(async move {
                if let Ok(Ok(())) = handle.await {
                    warn!("Capture device opened after timeout, releasing");
                    close_source(&source, limit).await;
                }
            }));
            Err(EngineError::DeviceUnavailable(format!(
                "open timed out after {:?}",
                limit
            )))
        }
    }
}

/// Release the capture device if it is held. Returns once the close has
/// run, warning if that takes longer than `warn_after`.
pub(crate) async fn close_source(source: &SharedSource, warn_after: Duration) {
    let mut handle = tokio::task::spawn_blocking({
        let source = Arc::clone(source);
        move || {
            let mut src = lock_source(&source);
            if src.is_open() {
                src.close();
            }
        }
    });

    let closed = match tokio::time::timeout(warn_after, &mut handle).await {
        Ok(closed) => closed,
        Err(_) => {
            warn!(
                "Capture device close still pending after {:?}, waiting",
                warn_after
            );
            handle.await
        }
    };
    match closed {
        Ok(()) => debug!("Capture device released"),
        Err(e) => error!("Close worker failed: {}", e),
    }
}

type FrameResult = Result<(PresenceSignal, String), SignalError>;

/// Reads frames without ever stacking blocked workers.
///
/// Each call waits at most `read_timeout`. A read that overruns stays
/// pending and the next call waits on it again, so one slow frame costs at
/// most one failure and a hung device fails once per window.
struct FrameReader {
    source: SharedSource,
    windows: Arc<dyn WindowInspector>,
    read_timeout: Duration,
    pending: Option<JoinHandle<FrameResult>>,
}

impl FrameReader {
    async fn read(&mut self) -> FrameResult {
        let mut handle = match self.pending.take() {
            Some(pending) => pending,
            None => tokio::task::spawn_blocking({
                let source = Arc::clone(&self.source);
                let windows = Arc::clone(&self.windows);
                move || -> FrameResult {
                    let signal = lock_source(&source).sample()?;
                    Ok((signal, windows.active_title()))
                }
            }),
        };

        match tokio::time::timeout(self.read_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(SignalError::Read(format!("read worker failed: {}", join_err))),
            Err(_) => {
                self.pending = Some(handle);
                Err(SignalError::Timeout)
            }
        }
    }
}

/// Everything the loop needs, detached from the engine handle
pub(crate) struct SamplerContext {
    pub state: Arc<Mutex<EngineState>>,
    pub source: SharedSource,
    pub windows: Arc<dyn WindowInspector>,
    pub events: broadcast::Sender<EngineEvent>,
    pub config: SamplerConfig,
}

/// Run until cancelled or until the device fails too often in a row
pub(crate) async fn sampling_loop(ctx: SamplerContext, session_id: Uuid, cancel: CancellationToken) {
    info!(
        "Sampling loop started for session {} at {:.1} Hz",
        session_id, ctx.config.max_rate_hz
    );

    let mut ticker = tokio::time::interval(ctx.config.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut reader = FrameReader {
        source: Arc::clone(&ctx.source),
        windows: Arc::clone(&ctx.windows),
        read_timeout: ctx.config.read_timeout(),
        pending: None,
    };
    let mut consecutive_failures = 0u32;

    let reason = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Sampling loop cancelled");
                break SessionEndReason::Requested;
            }
            _ = ticker.tick() => {}
        }

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => break SessionEndReason::Requested,
            read = reader.read() => read,
        };

        match read {
            Ok((signal, title)) => {
                consecutive_failures = 0;
                let now = Instant::now();
                let counters = {
                    let mut state = lock_state(&ctx.state);
                    state.apply_reading(signal, title, now);
                    state.accumulator.snapshot()
                };
                metrics::counter!("focus_ticks_total").increment(1);
                metrics::gauge!("focus_focused_seconds").set(counters.focused_seconds);
                metrics::gauge!("focus_distracted_seconds").set(counters.distracted_seconds);
            }
            Err(e) => {
                consecutive_failures += 1;
                metrics::counter!("focus_read_failures_total").increment(1);
                warn!(
                    "Frame read failed ({}/{}): {}",
                    consecutive_failures, ctx.config.max_consecutive_failures, e
                );
                if consecutive_failures >= ctx.config.max_consecutive_failures {
                    error!("Capture device unavailable, ending session {}", session_id);
                    break SessionEndReason::DeviceUnavailable {
                        detail: e.to_string(),
                    };
                }
            }
        }
    };

    // Stays Stopping until a read stuck in the device has returned and the
    // close has run
    lock_state(&ctx.state).loop_state = LoopState::Stopping;
    close_source(&ctx.source, ctx.config.open_timeout()).await;
    finish_session(&ctx.state, &ctx.events, session_id, reason);
}

/// Freeze accounting and announce the end of a session
pub(crate) fn finish_session(
    state: &Mutex<EngineState>,
    events: &broadcast::Sender<EngineEvent>,
    session_id: Uuid,
    reason: SessionEndReason,
) {
    lock_state(state).end_session(&reason);
    info!("Session {} ended: {:?}", session_id, reason);
    let _ = events.send(EngineEvent::SessionEnded {
        session_id: Some(session_id),
        reason,
    });
}
