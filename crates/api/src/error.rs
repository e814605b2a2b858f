//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use focus_engine::EngineError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Metrics exporter not installed")]
    MetricsUnavailable,
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Engine(EngineError::AlreadyRunning) => (StatusCode::CONFLICT, "already_running"),
            ApiError::Engine(EngineError::NotRunning) => (StatusCode::CONFLICT, "not_running"),
            ApiError::Engine(EngineError::DeviceUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "device_unavailable")
            }
            ApiError::Engine(EngineError::InvalidConfig(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_config")
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::MetricsUnavailable => (StatusCode::NOT_FOUND, "metrics_unavailable"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::warn!("{}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(EngineError::AlreadyRunning), StatusCode::CONFLICT),
            (ApiError::from(EngineError::NotRunning), StatusCode::CONFLICT),
            (
                ApiError::from(EngineError::DeviceUnavailable("no camera".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
