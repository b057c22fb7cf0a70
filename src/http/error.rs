//! Per-request error taxonomy and response mapping.
//!
//! Every failure mode is a per-call value, never a crash. Validation errors
//! are raised before any state is touched; breaker rejections before any
//! network attempt.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller-supplied parameter outside its allowed range.
    #[error("{0}")]
    Validation(String),

    /// Admission refusal. A control decision, not a defect.
    #[error("load shed: queue depth too high")]
    Shed,

    /// The local workload simulator's failure draw.
    #[error("simulated failure")]
    SimulatedFailure,

    /// The upstream simulator endpoint's own failure draw.
    #[error("upstream failure")]
    UpstreamFailure,

    /// Fast rejection without a network attempt.
    #[error("circuit breaker open")]
    BreakerOpen,

    /// No upstream response within the caller's deadline.
    #[error("upstream timeout")]
    UpstreamTimeout,

    /// Upstream responded with a failure status.
    #[error("upstream error")]
    UpstreamError,

    /// Connection-level failure before any upstream response.
    #[error("upstream transport error")]
    UpstreamTransport,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Shed => StatusCode::TOO_MANY_REQUESTS,
            ApiError::SimulatedFailure => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamFailure | ApiError::BreakerOpen => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::UpstreamError | ApiError::UpstreamTransport => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
