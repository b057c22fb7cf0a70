//! Queue-depth admission control.
//!
//! # Responsibilities
//! - Accept or shed incoming work based on reported queue depth
//! - Publish every observed depth to the queue-depth gauge
//!
//! # Design Decisions
//! - Strict greater-than: a depth exactly at the limit is accepted
//! - The controller never samples depth itself; callers supply it
//! - Stateless, safe for any number of concurrent callers

use crate::observability::metrics;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    Accept,
    Shed,
}

/// Admission controller holding the configured default queue limit.
pub struct AdmissionController {
    default_queue_limit: u32,
}

impl AdmissionController {
    pub fn new(default_queue_limit: u32) -> Self {
        Self { default_queue_limit }
    }

    /// Decide whether to accept work at the given queue depth.
    ///
    /// The depth is published to the gauge before the decision is made,
    /// so shed traffic is observable too.
    pub fn decide(&self, queue_depth: u32, queue_limit: Option<u32>) -> AdmissionDecision {
        let limit = queue_limit.unwrap_or(self.default_queue_limit);
        metrics::record_queue_depth(queue_depth);

        if queue_depth > limit {
            tracing::warn!(queue_depth, queue_limit = limit, "Shedding work");
            AdmissionDecision::Shed
        } else {
            AdmissionDecision::Accept
        }
    }
}
