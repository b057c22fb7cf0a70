//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → circuit_breaker.rs (gate: reject while open, auto-close after cooldown)
//!     → bounded-timeout call in upstream::client
//!     → circuit_breaker.rs (record outcome, open on repeated failure)
//! ```
//!
//! # Design Decisions
//! - One breaker instance guards the single upstream dependency
//! - The breaker lock is never held across the network call
//! - No retries here; callers see one outcome per attempt

pub mod circuit_breaker;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker};
