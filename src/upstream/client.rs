//! Breaker-gated client for the remote work simulator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Request;
use hyper::StatusCode;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;

/// Classified result of one upstream invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamOutcome {
    Success,
    /// Rejected by the breaker; no network attempt was made.
    BreakerOpen,
    /// No response within the caller's deadline.
    Timeout,
    /// A response arrived with a failure status.
    RemoteError(StatusCode),
    /// Connection-level failure before any response.
    TransportError,
}

impl UpstreamOutcome {
    /// Label used for the `result` metric dimension.
    pub fn result_label(&self) -> &'static str {
        match self {
            UpstreamOutcome::Success => "ok",
            UpstreamOutcome::BreakerOpen => "breaker_open",
            UpstreamOutcome::Timeout => "timeout",
            UpstreamOutcome::RemoteError(_) => "error",
            UpstreamOutcome::TransportError => "transport",
        }
    }
}

/// Client for the upstream work-simulation endpoint, guarded by the
/// process-wide circuit breaker.
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    breaker: Arc<CircuitBreaker>,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, breaker: Arc<CircuitBreaker>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let base_url =
            Url::parse(&config.base_url).expect("upstream.base_url validated at startup");
        Self {
            client,
            breaker,
            base_url,
        }
    }

    /// The breaker guarding this client.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Make one breaker-gated, bounded-timeout call to the remote simulator.
    ///
    /// The breaker lock is taken twice: once for the gate, once to record the
    /// outcome. It is not held while the request is in flight.
    pub async fn call(
        &self,
        duration_ms: u64,
        failure_probability: f64,
        timeout: Duration,
    ) -> UpstreamOutcome {
        if self.breaker.try_acquire().is_err() {
            tracing::warn!("Rejecting upstream call, circuit breaker open");
            metrics::record_upstream_rejected();
            metrics::record_breaker_state(&self.breaker.snapshot());
            return UpstreamOutcome::BreakerOpen;
        }
        metrics::record_breaker_state(&self.breaker.snapshot());

        let mut url = self.base_url.clone();
        url.set_path("/upstream");
        url.set_query(Some(&format!(
            "ms={duration_ms}&fail_rate={failure_probability}"
        )));

        let start = Instant::now();
        let outcome = match Request::builder()
            .method("GET")
            .uri(url.as_str())
            .header("user-agent", "load-gate-upstream")
            .body(Body::empty())
        {
            Ok(request) => {
                // Dropping the future on timeout abandons the in-flight call,
                // so a late completion cannot be observed for this attempt.
                let response_future = self.client.request(request);
                match time::timeout(timeout, response_future).await {
                    Ok(Ok(response)) if response.status().is_success() => UpstreamOutcome::Success,
                    Ok(Ok(response)) => {
                        tracing::warn!(status = %response.status(), "Upstream returned failure status");
                        UpstreamOutcome::RemoteError(response.status())
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Upstream transport error");
                        UpstreamOutcome::TransportError
                    }
                    Err(_) => {
                        tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Upstream call timed out");
                        UpstreamOutcome::Timeout
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build upstream request");
                UpstreamOutcome::TransportError
            }
        };

        match outcome {
            UpstreamOutcome::Success => self.breaker.record_success(),
            _ => self.breaker.record_failure(),
        }
        metrics::record_upstream_attempt(outcome.result_label(), start);
        metrics::record_breaker_state(&self.breaker.snapshot());

        outcome
    }
}
