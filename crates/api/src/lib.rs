//! Focus Tracker API Server
//!
//! JSON adapter over the focus engine's snapshot and control traits.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use focus_engine::{FocusEngine, LoopState, SessionController, SnapshotProvider};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::{AppConfig, DemoConfig, ServerConfig};
pub use error::ApiError;
pub use rate_limit::{create_governor_config, RateLimitConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Read side of the engine
    pub provider: Arc<dyn SnapshotProvider>,
    /// Control side of the engine
    pub controller: Arc<dyn SessionController>,
    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state over one engine
    pub fn new(engine: Arc<FocusEngine>) -> Self {
        let provider: Arc<dyn SnapshotProvider> = engine.clone();
        let controller: Arc<dyn SessionController> = engine;
        Self {
            provider,
            controller,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Serve `/metrics` from this handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub session: SessionHealth,
}

/// Sampling loop health
#[derive(Debug, Serialize)]
pub struct SessionHealth {
    pub loop_state: LoopState,
    pub session_id: Option<String>,
    pub last_error: Option<String>,
}

/// Create the application router.
///
/// Control routes are throttled when `rate_limit` is given.
pub fn create_router(state: Arc<AppState>, rate_limit: Option<&RateLimitConfig>) -> Router {
    let mut control = Router::new()
        .route("/api/v1/session/start", post(routes::session::start_session))
        .route("/api/v1/session/stop", post(routes::session::stop_session))
        .route("/api/v1/countdown/start", post(routes::countdown::start))
        .route("/api/v1/countdown/pause", post(routes::countdown::pause))
        .route("/api/v1/countdown/resume", post(routes::countdown::resume))
        .route("/api/v1/countdown/reset", post(routes::countdown::reset));

    if let Some(limits) = rate_limit {
        match create_governor_config(limits) {
            Some(config) => control = control.layer(GovernorLayer { config }),
            None => warn!("Invalid rate limit {:?}, control routes unthrottled", limits),
        }
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/stats", get(routes::session::get_stats))
        .route("/api/v1/distractors", get(routes::reports::get_distractors))
        .route("/api/v1/timeseries", get(routes::reports::get_timeseries))
        .route("/api/v1/windows", get(routes::reports::get_windows))
        .route("/metrics", get(metrics_handler))
        .merge(control)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.provider.snapshot();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let status = if snapshot.last_error.is_some() {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        session: SessionHealth {
            loop_state: snapshot.loop_state,
            session_id: snapshot.session_id.map(|id| id.to_string()),
            last_error: snapshot.last_error,
        },
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(ApiError::MetricsUnavailable)
}

/// Initialize logging
pub fn init_logging(level: &str, json: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Serve until Ctrl-C
pub async fn run_server(config: &ServerConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let app = create_router(state, config.rate_limit.as_ref());

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler failed: {}", e);
        }
        info!("Shutdown requested");
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use focus_engine::{CountdownConfig, EngineConfig, SamplerConfig};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use signal_source::{PresenceSignal, ScriptedSource, ScriptedWindows};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_engine(source: ScriptedSource) -> Arc<FocusEngine> {
        let config = EngineConfig {
            sampler: SamplerConfig {
                max_rate_hz: 200.0,
                ..Default::default()
            },
            countdown: CountdownConfig {
                session_length_secs: 60,
                tick_interval_ms: 20,
            },
            ..Default::default()
        };
        let windows = ScriptedWindows::focused_on("Editor");
        windows.open_window("Browser");
        Arc::new(FocusEngine::new(config, source, windows).unwrap())
    }

    fn test_app(engine: Arc<FocusEngine>) -> Router {
        create_router(Arc::new(AppState::new(engine)), None)
    }

    fn attentive() -> ScriptedSource {
        ScriptedSource::steady(PresenceSignal::attentive())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app(test_engine(attentive()));
        let response = app.oneshot(get("/api/v1/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["session"]["loop_state"], "idle");
    }

    #[tokio::test]
    async fn test_stats_before_session() {
        let app = test_app(test_engine(attentive()));
        let body = json_body(app.oneshot(get("/api/v1/stats")).await.unwrap()).await;

        assert_eq!(body["focus_state"], "idle");
        assert_eq!(body["focused_seconds"], 0.0);
        assert_eq!(body["countdown"]["remaining_text"], "01:00");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_session_lifecycle() {
        let engine = test_engine(attentive());
        let app = test_app(engine.clone());

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/session/start", r#"{"targets":["Editor"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let started = json_body(response).await;
        assert_eq!(started["targets"], serde_json::json!(["Editor"]));
        assert!(started["warning"].is_null());

        let again = app
            .clone()
            .oneshot(post_json("/api/v1/session/start", r#"{"targets":["Editor"]}"#))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(again).await["code"], "already_running");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let stopped = app.clone().oneshot(post("/api/v1/session/stop")).await.unwrap();
        assert_eq!(stopped.status(), StatusCode::OK);
        let body = json_body(stopped).await;
        assert!(body["focused_seconds"].as_f64().unwrap() > 0.0);
        assert_eq!(body["loop_state"], "idle");

        let twice = app.oneshot(post("/api/v1/session/stop")).await.unwrap();
        assert_eq!(twice.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_device_failure_is_503() {
        let app = test_app(test_engine(attentive().failing_open()));
        let response = app
            .oneshot(post_json("/api/v1/session/start", r#"{"targets":["Editor"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["code"], "device_unavailable");
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = test_app(test_engine(attentive()));
        for body in [r#"{"targets": "Editor"}"#, "not json", "{}"] {
            let response = app
                .clone()
                .oneshot(post_json("/api/v1/session/start", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
        }
    }

    #[tokio::test]
    async fn test_countdown_misuse_is_409() {
        let app = test_app(test_engine(attentive()));
        let response = app
            .clone()
            .oneshot(post("/api/v1/countdown/pause"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let started = app
            .clone()
            .oneshot(post("/api/v1/countdown/start"))
            .await
            .unwrap();
        assert_eq!(started.status(), StatusCode::OK);
        assert_eq!(json_body(started).await["running"], true);

        let reset = app.oneshot(post("/api/v1/countdown/reset")).await.unwrap();
        assert_eq!(json_body(reset).await["phase"], "idle");
    }

    #[tokio::test]
    async fn test_windows_and_empty_reports() {
        let app = test_app(test_engine(attentive()));

        let windows = json_body(app.clone().oneshot(get("/api/v1/windows")).await.unwrap()).await;
        assert_eq!(windows["data"], serde_json::json!(["Editor", "Browser"]));

        let distractors =
            json_body(app.clone().oneshot(get("/api/v1/distractors")).await.unwrap()).await;
        assert_eq!(distractors["count"], 0);

        let series = json_body(app.oneshot(get("/api/v1/timeseries")).await.unwrap()).await;
        assert_eq!(series["count"], 0);
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let engine = test_engine(attentive());
        let app = test_app(engine.clone());
        let missing = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let handle = PrometheusBuilder::new().build_recorder().handle();
        let state = Arc::new(AppState::new(engine).with_metrics(handle));
        let response = create_router(state, None)
            .oneshot(get("/metrics"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_control_routes_rate_limited() {
        let limits = RateLimitConfig {
            per_second: 60,
            burst_size: 2,
        };
        let app = create_router(
            Arc::new(AppState::new(test_engine(attentive()))),
            Some(&limits),
        );
        let peer: SocketAddr = "10.0.0.7:40000".parse().unwrap();

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let mut request = post("/api/v1/countdown/reset");
            request.extensions_mut().insert(ConnectInfo(peer));
            statuses.push(app.clone().oneshot(request).await.unwrap().status());
        }
        assert_eq!(statuses[0], StatusCode::OK);
        assert_eq!(statuses[2], StatusCode::TOO_MANY_REQUESTS);

        // Read routes are not throttled
        for _ in 0..5 {
            let response = app.clone().oneshot(get("/api/v1/stats")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
