//! Focus Tracker - Main Entry Point
//!
//! Runs the focus engine against scripted inputs and serves the JSON API.

use anyhow::Context;
use api::{init_logging, run_server, AppConfig, AppState, DemoConfig};
use focus_engine::{EngineEvent, FocusEngine};
use metrics_exporter_prometheus::PrometheusBuilder;
use signal_source::{PresenceSignal, ScriptStep, ScriptedSource, ScriptedWindows};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_logging(&config.server.log_level, config.server.log_json)
        .context("installing tracing subscriber")?;

    info!("=== Focus Tracker v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;

    let windows = demo_windows(&config.demo);
    let engine = Arc::new(
        FocusEngine::new(config.engine.clone(), demo_source(), windows.clone())
            .context("creating focus engine")?,
    );

    tokio::spawn(log_events(engine.subscribe()));
    if config.demo.rotate_secs > 0 && config.demo.windows.len() > 1 {
        tokio::spawn(rotate_windows(
            windows,
            config.demo.windows.clone(),
            Duration::from_secs(config.demo.rotate_secs),
        ));
    }

    let state = Arc::new(AppState::new(engine.clone()).with_metrics(metrics));
    run_server(&config.server, state)
        .await
        .context("running API server")?;

    engine.shutdown().await;
    Ok(())
}

/// Mostly attentive, with short spells of looking away and absence
fn demo_source() -> ScriptedSource {
    let mut steps = vec![ScriptStep::Frame(PresenceSignal::attentive()); 240];
    steps.extend(vec![ScriptStep::Frame(PresenceSignal::looking_away()); 30]);
    steps.extend(vec![ScriptStep::Frame(PresenceSignal::attentive()); 180]);
    steps.extend(vec![ScriptStep::Frame(PresenceSignal::absent()); 45]);
    ScriptedSource::cycle(steps)
}

fn demo_windows(demo: &DemoConfig) -> ScriptedWindows {
    let windows = ScriptedWindows::default();
    for title in &demo.windows {
        windows.open_window(title);
    }
    if let Some(first) = demo.windows.first() {
        windows.focus(first);
    }
    windows
}

async fn rotate_windows(windows: ScriptedWindows, titles: Vec<String>, every: Duration) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
    for title in titles.iter().cycle().skip(1) {
        interval.tick().await;
        info!("Demo: switching to '{}'", title);
        windows.focus(title);
    }
}

async fn log_events(mut events: tokio::sync::broadcast::Receiver<EngineEvent>) {
    loop {
        match events.recv().await {
            Ok(EngineEvent::SessionEnded { session_id, reason }) => {
                info!("Session {:?} ended: {:?}", session_id, reason)
            }
            Ok(EngineEvent::CountdownCompleted { completed_sessions }) => {
                info!("Work session complete ({} so far)", completed_sessions)
            }
            Ok(event) => info!("Engine event: {:?}", event),
            Err(RecvError::Lagged(n)) => warn!("Dropped {} engine events", n),
            Err(RecvError::Closed) => break,
        }
    }
}
