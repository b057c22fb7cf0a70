//! Synthetic workload simulation.
//!
//! # Responsibilities
//! - Burn CPU for a requested duration (stand-in for real compute)
//! - Inject failures via a configurable probability draw
//!
//! # Design Decisions
//! - Busy-wait, not sleep: the cost must be paid on a worker thread
//! - The spin and the failure draw are independent steps
//! - Randomness sits behind the `Sampler` trait so tests can force outcomes

use std::hint::black_box;
use std::time::{Duration, Instant};

use rand::Rng;

/// Source of randomness for failure draws and queue-depth sampling.
pub trait Sampler: Send + Sync {
    /// Uniform draw from `[0, 1)`.
    fn unit(&self) -> f64;

    /// Uniform queue depth from `[0, 100]`.
    fn queue_depth(&self) -> u32;
}

/// Production sampler backed by the thread-local RNG.
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn queue_depth(&self) -> u32 {
        rand::thread_rng().gen_range(0..=100)
    }
}

/// Busy-wait for approximately `duration`, returning the observed elapsed time.
///
/// Deliberately CPU-bound. Callers on the async runtime must run this via
/// `tokio::task::spawn_blocking`.
pub fn cpu_spin(duration: Duration) -> Duration {
    let start = Instant::now();
    let deadline = start + duration;
    let mut x: u64 = 0;
    while Instant::now() < deadline {
        x = black_box(x.wrapping_mul(13).wrapping_add(7) % 1_000_003);
    }
    start.elapsed()
}

/// Decide whether a simulated work item fails, given the failure probability.
pub fn draw_failure(sampler: &dyn Sampler, failure_probability: f64) -> bool {
    sampler.unit() < failure_probability
}
