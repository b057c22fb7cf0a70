//! HTTP server setup and handlers.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, request timeout, HTTP metrics)
//! - Bind the server to a listener, serve until shutdown
//! - Dispatch to admission control, the workload simulator, and the
//!   breaker-gated upstream client

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admission::{AdmissionController, AdmissionDecision};
use crate::config::GateConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;
use crate::upstream::{UpstreamClient, UpstreamOutcome};
use crate::workload::{self, Sampler, ThreadRngSampler};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GateConfig>,
    pub admission: Arc<AdmissionController>,
    pub sampler: Arc<dyn Sampler>,
    pub upstream: Arc<UpstreamClient>,
}

/// HTTP server for the load gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GateConfig) -> Self {
        Self::with_sampler(config, Arc::new(ThreadRngSampler))
    }

    /// Create a server with an explicit randomness source, so tests can force
    /// failure draws and queue-depth samples.
    pub fn with_sampler(config: GateConfig, sampler: Arc<dyn Sampler>) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(
            config.breaker.failure_threshold,
            Duration::from_millis(config.breaker.open_duration_ms),
        ));

        let state = AppState {
            admission: Arc::new(AdmissionController::new(config.admission.queue_limit)),
            sampler,
            upstream: Arc::new(UpstreamClient::new(&config.upstream, breaker)),
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        Router::new()
            .route("/work", post(work))
            .route("/upstream", get(upstream))
            .route("/client", get(client))
            .route("/healthz", get(healthz))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(metrics::track_http))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

fn default_work_ms() -> u64 {
    50
}

fn default_work_fail_rate() -> f64 {
    0.02
}

fn default_upstream_ms() -> u64 {
    50
}

fn default_upstream_fail_rate() -> f64 {
    0.0
}

fn default_timeout_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize)]
pub struct WorkParams {
    #[serde(default = "default_work_ms")]
    pub ms: u64,
    #[serde(default = "default_work_fail_rate")]
    pub fail_rate: f64,
    pub queue_depth: Option<u32>,
    pub queue_limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamParams {
    #[serde(default = "default_upstream_ms")]
    pub ms: u64,
    #[serde(default = "default_upstream_fail_rate")]
    pub fail_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct ClientParams {
    #[serde(default = "default_upstream_ms")]
    pub ms: u64,
    #[serde(default = "default_upstream_fail_rate")]
    pub fail_rate: f64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn validate_duration_ms(name: &str, value: u64, max: u64) -> Result<(), ApiError> {
    if value < 1 || value > max {
        return Err(ApiError::Validation(format!(
            "{name} must be between 1 and {max}"
        )));
    }
    Ok(())
}

fn validate_fail_rate(fail_rate: f64) -> Result<(), ApiError> {
    if !(0.0..=1.0).contains(&fail_rate) {
        return Err(ApiError::Validation(
            "fail_rate must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

/// Submit local work: admission check, then simulated compute.
async fn work(
    State(state): State<AppState>,
    Query(params): Query<WorkParams>,
) -> Result<Json<Value>, ApiError> {
    validate_duration_ms("ms", params.ms, state.config.admission.max_duration_ms)?;
    validate_fail_rate(params.fail_rate)?;

    let queue_depth = params
        .queue_depth
        .unwrap_or_else(|| state.sampler.queue_depth());

    if state.admission.decide(queue_depth, params.queue_limit) == AdmissionDecision::Shed {
        metrics::record_work_item("shed");
        return Err(ApiError::Shed);
    }

    let requested = Duration::from_millis(params.ms);
    tokio::task::spawn_blocking(move || workload::cpu_spin(requested))
        .await
        .expect("workload task panicked");

    if workload::draw_failure(state.sampler.as_ref(), params.fail_rate) {
        metrics::record_work_item("error");
        return Err(ApiError::SimulatedFailure);
    }

    metrics::record_work_item("ok");
    Ok(Json(json!({
        "status": "ok",
        "ms": params.ms,
        "queue_depth": queue_depth,
    })))
}

/// Standalone work simulation: the remote instance of the workload contract.
async fn upstream(
    State(state): State<AppState>,
    Query(params): Query<UpstreamParams>,
) -> Result<Json<Value>, ApiError> {
    validate_duration_ms("ms", params.ms, state.config.upstream.max_duration_ms)?;
    validate_fail_rate(params.fail_rate)?;

    let requested = Duration::from_millis(params.ms);
    tokio::task::spawn_blocking(move || workload::cpu_spin(requested))
        .await
        .expect("workload task panicked");

    if workload::draw_failure(state.sampler.as_ref(), params.fail_rate) {
        return Err(ApiError::UpstreamFailure);
    }

    Ok(Json(json!({ "ok": true, "ms": params.ms })))
}

/// Breaker-gated call to the remote work simulator.
async fn client(
    State(state): State<AppState>,
    Query(params): Query<ClientParams>,
) -> Result<Json<Value>, ApiError> {
    validate_duration_ms("ms", params.ms, state.config.upstream.max_duration_ms)?;
    validate_fail_rate(params.fail_rate)?;
    validate_duration_ms(
        "timeout_ms",
        params.timeout_ms,
        state.config.upstream.max_timeout_ms,
    )?;

    let timeout = Duration::from_millis(params.timeout_ms);
    match state.upstream.call(params.ms, params.fail_rate, timeout).await {
        UpstreamOutcome::Success => Ok(Json(json!({
            "ok": true,
            "ms": params.ms,
            "timeout_ms": params.timeout_ms,
        }))),
        UpstreamOutcome::BreakerOpen => Err(ApiError::BreakerOpen),
        UpstreamOutcome::Timeout => Err(ApiError::UpstreamTimeout),
        UpstreamOutcome::RemoteError(_) => Err(ApiError::UpstreamError),
        UpstreamOutcome::TransportError => Err(ApiError::UpstreamTransport),
    }
}

/// Liveness probe. Independent of breaker and admission state.
async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}
