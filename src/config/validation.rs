//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds and bounds > 0)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GateConfig;

/// A single semantic violation in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a valid socket address")]
    InvalidMetricsAddress(String),

    #[error("upstream.base_url `{0}` is not a valid URL")]
    InvalidBaseUrl(String),

    #[error("breaker.failure_threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("breaker.open_duration_ms must be at least 1")]
    ZeroOpenDuration,

    #[error("admission.max_duration_ms must be at least 1")]
    ZeroAdmissionDurationBound,

    #[error("upstream.max_duration_ms must be at least 1")]
    ZeroUpstreamDurationBound,

    #[error("upstream.max_timeout_ms must be at least 1")]
    ZeroTimeoutBound,

    #[error("timeouts.request_secs must be at least 1")]
    ZeroRequestTimeout,
}

/// Check the semantic constraints of a deserialized configuration.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if Url::parse(&config.upstream.base_url).is_err() {
        errors.push(ValidationError::InvalidBaseUrl(
            config.upstream.base_url.clone(),
        ));
    }
    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold);
    }
    if config.breaker.open_duration_ms == 0 {
        errors.push(ValidationError::ZeroOpenDuration);
    }
    if config.admission.max_duration_ms == 0 {
        errors.push(ValidationError::ZeroAdmissionDurationBound);
    }
    if config.upstream.max_duration_ms == 0 {
        errors.push(ValidationError::ZeroUpstreamDurationBound);
    }
    if config.upstream.max_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeoutBound);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
