//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_request_duration_seconds` (histogram): request latency
//! - `http_inflight_requests` (gauge): requests currently in flight
//! - `work_items_total` (counter): work items by outcome (ok/shed/error)
//! - `work_queue_depth` (gauge): last observed synthetic queue depth
//! - `upstream_requests_total` (counter): upstream calls by result
//! - `upstream_request_duration_seconds` (histogram): upstream latency by result
//! - `circuit_breaker_state` (gauge): 0 closed, 1 open
//! - `circuit_breaker_open_until_epoch` (gauge): reopen deadline, 0 while closed

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

use crate::resilience::BreakerSnapshot;

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0];

/// Install the Prometheus exporter on its own listener address.
pub fn init_metrics(addr: SocketAddr) {
    let install = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .and_then(|builder| {
            builder.set_buckets_for_metric(
                Matcher::Full("upstream_request_duration_seconds".to_string()),
                LATENCY_BUCKETS,
            )
        })
        .and_then(|builder| builder.install());

    match install {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

fn describe_metrics() {
    describe_counter!("http_requests_total", "Total HTTP requests");
    describe_histogram!("http_request_duration_seconds", "Request latency in seconds");
    describe_gauge!("http_inflight_requests", "In-flight requests");
    describe_counter!("work_items_total", "Total work items processed");
    describe_gauge!("work_queue_depth", "Synthetic queue depth");
    describe_counter!("upstream_requests_total", "Upstream requests by result");
    describe_histogram!(
        "upstream_request_duration_seconds",
        "Upstream request latency in seconds"
    );
    describe_gauge!("circuit_breaker_state", "0 closed, 1 open");
    describe_gauge!(
        "circuit_breaker_open_until_epoch",
        "Epoch time until breaker closes"
    );
}

/// Middleware tracking in-flight count, request counter, and latency for
/// every route.
pub async fn track_http(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    gauge!("http_inflight_requests").increment(1.0);
    let start = Instant::now();

    let response = next.run(request).await;

    gauge!("http_inflight_requests").decrement(1.0);
    record_request(&method, &path, response.status().as_u16(), start);

    response
}

/// Record one completed HTTP request.
pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Record a work-item outcome (`ok`, `shed`, or `error`).
pub fn record_work_item(outcome: &'static str) {
    counter!("work_items_total", "outcome" => outcome).increment(1);
}

/// Publish the observed queue depth.
pub fn record_queue_depth(depth: u32) {
    gauge!("work_queue_depth").set(depth as f64);
}

/// Record an attempted upstream call with its result label and latency.
pub fn record_upstream_attempt(result: &'static str, start: Instant) {
    histogram!("upstream_request_duration_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
    counter!("upstream_requests_total", "result" => result).increment(1);
}

/// Record an upstream call rejected by the breaker (no attempt, no latency).
pub fn record_upstream_rejected() {
    counter!("upstream_requests_total", "result" => "breaker_open").increment(1);
}

/// Mirror the breaker state into its gauges.
pub fn record_breaker_state(snapshot: &BreakerSnapshot) {
    gauge!("circuit_breaker_state").set(if snapshot.open { 1.0 } else { 0.0 });
    gauge!("circuit_breaker_open_until_epoch").set(snapshot.open_until_epoch);
}
