//! Countdown ticker task

use countdown::CountdownEvent;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::sampler::lock_state;
use crate::state::EngineState;
use crate::EngineEvent;

/// Advance the countdown once per `period` until it goes idle or is cancelled
pub(crate) async fn countdown_ticker(
    state: Arc<Mutex<EngineState>>,
    events: broadcast::Sender<EngineEvent>,
    period: Duration,
    stale_after: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Countdown ticker cancelled");
                return;
            }
            _ = interval.tick() => {}
        }

        let (event, active) = lock_state(&state).countdown_tick(Instant::now(), stale_after);

        if let Some(event) = event {
            let event = match event {
                CountdownEvent::Paused => EngineEvent::CountdownPaused,
                CountdownEvent::Resumed => EngineEvent::CountdownResumed,
                CountdownEvent::Completed { completed_sessions } => {
                    metrics::counter!("focus_countdown_completed_total").increment(1);
                    info!("Work session completed ({} total)", completed_sessions);
                    EngineEvent::CountdownCompleted { completed_sessions }
                }
            };
            let _ = events.send(event);
        }

        if !active {
            debug!("Countdown idle, ticker exiting");
            return;
        }
    }
}
