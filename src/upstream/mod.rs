//! Upstream dependency client.
//!
//! # Data Flow
//! ```text
//! /client handler
//!     → circuit breaker gate (reject fast while open)
//!     → single bounded-timeout GET to the remote work simulator
//!     → outcome classification (success / timeout / remote error / transport)
//!     → circuit breaker update + metrics
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt per invocation; the caller decides whether to retry
//! - Timeout cancels the in-flight call by dropping it; an abandoned call can
//!   never report an outcome for an attempt already classified

pub mod client;

pub use client::{UpstreamClient, UpstreamOutcome};
