//! Integration tests for the breaker-gated upstream client.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use load_gate::config::UpstreamConfig;
use load_gate::resilience::CircuitBreaker;
use load_gate::upstream::{UpstreamClient, UpstreamOutcome};
use load_gate::GateConfig;
use serde_json::Value;

mod common;

fn gate_config(upstream_addr: std::net::SocketAddr) -> GateConfig {
    let mut config = GateConfig::default();
    config.upstream.base_url = format!("http://{}", upstream_addr);
    config
}

#[tokio::test]
async fn healthy_upstream_yields_success_and_keeps_breaker_closed() {
    let upstream_addr =
        common::start_programmable_upstream(|| async { (200, r#"{"ok":true}"#.into()) }).await;
    let (addr, shutdown) = common::start_gate(gate_config(upstream_addr)).await;
    let client = common::test_client();

    for _ in 0..3 {
        let res = client
            .get(format!(
                "http://{}/client?ms=50&fail_rate=0&timeout_ms=200",
                addr
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["ms"], 50);
        assert_eq!(body["timeout_ms"], 200);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn five_timeouts_open_the_breaker_and_the_sixth_call_never_reaches_upstream() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let upstream_addr = common::start_programmable_upstream(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(400)).await;
            (200, r#"{"ok":true}"#.into())
        }
    })
    .await;

    let (addr, shutdown) = common::start_gate(gate_config(upstream_addr)).await;
    let client = common::test_client();

    for _ in 0..5 {
        let res = client
            .get(format!(
                "http://{}/client?ms=50&fail_rate=0&timeout_ms=100",
                addr
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 504);
    }

    let attempts_before_rejection = attempts.load(Ordering::SeqCst);
    assert_eq!(attempts_before_rejection, 5);

    let res = client
        .get(format!(
            "http://{}/client?ms=50&fail_rate=0&timeout_ms=100",
            addr
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "circuit breaker open");

    // Give any stray in-flight work a moment, then confirm no sixth attempt.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), attempts_before_rejection);

    shutdown.trigger();
}

#[tokio::test]
async fn remote_failure_statuses_count_toward_the_threshold() {
    let upstream_addr =
        common::start_programmable_upstream(|| async { (503, "upstream failure".into()) }).await;
    let (addr, shutdown) = common::start_gate(gate_config(upstream_addr)).await;
    let client = common::test_client();

    for _ in 0..5 {
        let res = client
            .get(format!(
                "http://{}/client?ms=50&fail_rate=0&timeout_ms=200",
                addr
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 502);
    }

    let res = client
        .get(format!(
            "http://{}/client?ms=50&fail_rate=0&timeout_ms=200",
            addr
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "circuit breaker open");

    // Liveness is independent of breaker state.
    let res = client
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn a_success_resets_the_consecutive_failure_count() {
    let failing = Arc::new(AtomicBool::new(true));
    let toggle = failing.clone();
    let upstream_addr = common::start_programmable_upstream(move || {
        let toggle = toggle.clone();
        async move {
            if toggle.load(Ordering::SeqCst) {
                (503, "upstream failure".into())
            } else {
                (200, r#"{"ok":true}"#.into())
            }
        }
    })
    .await;

    let (addr, shutdown) = common::start_gate(gate_config(upstream_addr)).await;
    let client = common::test_client();
    let url = format!("http://{}/client?ms=50&fail_rate=0&timeout_ms=200", addr);

    for _ in 0..4 {
        assert_eq!(client.get(&url).send().await.unwrap().status(), 502);
    }

    failing.store(false, Ordering::SeqCst);
    assert_eq!(client.get(&url).send().await.unwrap().status(), 200);

    // Four more failures after the reset: still below threshold, every call
    // is attempted rather than rejected outright.
    failing.store(true, Ordering::SeqCst);
    for _ in 0..4 {
        assert_eq!(client.get(&url).send().await.unwrap().status(), 502);
    }

    // The fifth consecutive failure is what finally opens the circuit.
    assert_eq!(client.get(&url).send().await.unwrap().status(), 502);
    assert_eq!(client.get(&url).send().await.unwrap().status(), 503);

    shutdown.trigger();
}

#[tokio::test]
async fn breaker_auto_closes_after_the_cooldown() {
    let failing = Arc::new(AtomicBool::new(true));
    let toggle = failing.clone();
    let upstream_addr = common::start_programmable_upstream(move || {
        let toggle = toggle.clone();
        async move {
            if toggle.load(Ordering::SeqCst) {
                (503, "upstream failure".into())
            } else {
                (200, r#"{"ok":true}"#.into())
            }
        }
    })
    .await;

    let mut config = gate_config(upstream_addr);
    config.breaker.open_duration_ms = 500;
    let (addr, shutdown) = common::start_gate(config).await;
    let client = common::test_client();
    let url = format!("http://{}/client?ms=50&fail_rate=0&timeout_ms=200", addr);

    for _ in 0..5 {
        assert_eq!(client.get(&url).send().await.unwrap().status(), 502);
    }
    assert_eq!(client.get(&url).send().await.unwrap().status(), 503);

    failing.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(700)).await;

    // Cooldown passed: the next call closes the circuit and goes through.
    assert_eq!(client.get(&url).send().await.unwrap().status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn successful_call_leaves_breaker_closed_with_zero_failures() {
    let upstream_addr =
        common::start_programmable_upstream(|| async { (200, r#"{"ok":true}"#.into()) }).await;

    let mut config = UpstreamConfig::default();
    config.base_url = format!("http://{}", upstream_addr);
    let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(10)));
    let client = UpstreamClient::new(&config, breaker);

    let outcome = client.call(50, 0.0, Duration::from_millis(200)).await;
    assert_eq!(outcome, UpstreamOutcome::Success);

    let snap = client.breaker().snapshot();
    assert!(!snap.open);
    assert_eq!(snap.consecutive_failures, 0);
}

#[tokio::test]
async fn connection_refused_classifies_as_transport_error() {
    let mut config = UpstreamConfig::default();
    config.base_url = "http://127.0.0.1:1".to_string();
    let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(10)));
    let client = UpstreamClient::new(&config, breaker);

    let outcome = client.call(50, 0.0, Duration::from_millis(500)).await;
    assert_eq!(outcome, UpstreamOutcome::TransportError);
    assert_eq!(client.breaker().snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn validation_errors_never_touch_the_breaker() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let upstream_addr = common::start_programmable_upstream(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, r#"{"ok":true}"#.into())
        }
    })
    .await;

    let (addr, shutdown) = common::start_gate(gate_config(upstream_addr)).await;
    let client = common::test_client();

    for query in [
        "ms=0&fail_rate=0&timeout_ms=200",
        "ms=5001&fail_rate=0&timeout_ms=200",
        "ms=50&fail_rate=2&timeout_ms=200",
        "ms=50&fail_rate=0&timeout_ms=0",
        "ms=50&fail_rate=0&timeout_ms=10001",
    ] {
        let res = client
            .get(format!("http://{}/client?{}", addr, query))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400, "query `{}` should fail validation", query);
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 0);

    shutdown.trigger();
}
