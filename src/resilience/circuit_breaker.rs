//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast until the cooldown passes
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= threshold
//! Open → Closed: cooldown deadline passed (checked at the next call attempt)
//! ```
//!
//! This is a timed auto-reset breaker, not a canonical half-open breaker:
//! once the cooldown expires the circuit closes unconditionally and the next
//! call is evaluated with ordinary closed-state semantics. There is no
//! single-probe trial phase.

use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Error returned by [`CircuitBreaker::try_acquire`] while the circuit is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("circuit breaker open")]
pub struct BreakerOpen;

/// Point-in-time view of the breaker, for gauges and assertions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerSnapshot {
    pub open: bool,
    /// Epoch seconds at which an open circuit becomes eligible to close.
    /// Zero while closed.
    pub open_until_epoch: f64,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct BreakerState {
    open: bool,
    /// Meaningful only while `open`.
    open_until: Instant,
    open_until_epoch: f64,
    consecutive_failures: u32,
}

/// Consecutive-failure circuit breaker with timed auto-reset.
///
/// The `(open, open_until, consecutive_failures)` triple is guarded as one
/// unit by a single mutex. Each upstream call takes the lock twice: once in
/// [`try_acquire`](Self::try_acquire) before the call, once in
/// [`record_success`](Self::record_success)/[`record_failure`](Self::record_failure)
/// after it. The lock is never held across the call itself, so two callers
/// may both observe a closed circuit and proceed concurrently; the breaker
/// bounds damage, it does not serialize traffic.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    open_for: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(failure_threshold: u32, open_for: Duration) -> Self {
        Self {
            failure_threshold,
            open_for,
            state: Mutex::new(BreakerState {
                open: false,
                open_until: Instant::now(),
                open_until_epoch: 0.0,
                consecutive_failures: 0,
            }),
        }
    }

    /// Gate a call attempt.
    ///
    /// While open and inside the cooldown, returns `Err(BreakerOpen)` and
    /// leaves the failure count untouched. Once the cooldown has passed, the
    /// circuit closes (failure count reset to 0) and the attempt is permitted
    /// with closed-state semantics.
    pub fn try_acquire(&self) -> Result<(), BreakerOpen> {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        if state.open {
            if Instant::now() < state.open_until {
                return Err(BreakerOpen);
            }
            tracing::info!("Circuit breaker cooldown expired, closing");
            state.open = false;
            state.open_until_epoch = 0.0;
            state.consecutive_failures = 0;
        }
        Ok(())
    }

    /// Record a successful call. Resets the consecutive-failure count.
    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        state.consecutive_failures = 0;
    }

    /// Record a failed call (timeout, remote error, and transport error all
    /// count identically). Opens the circuit once the threshold is reached.
    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.failure_threshold {
            state.open = true;
            state.open_until = Instant::now() + self.open_for;
            state.open_until_epoch = epoch_seconds_after(self.open_for);
            tracing::warn!(
                consecutive_failures = state.consecutive_failures,
                open_for_ms = self.open_for.as_millis() as u64,
                "Circuit breaker opened"
            );
        }
    }

    /// Current state, read under the lock.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.state.lock().expect("circuit breaker mutex poisoned");
        BreakerSnapshot {
            open: state.open,
            open_until_epoch: state.open_until_epoch,
            consecutive_failures: state.consecutive_failures,
        }
    }
}

fn epoch_seconds_after(delta: Duration) -> f64 {
    (SystemTime::now() + delta)
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
