//! Circuit breaker.
//!
//! Fails fast after repeated failures and recovers automatically after a
//! cool-down window. One instance guards one logical remote dependency
//! and is shared process-wide: a failure storm from one tenant opens the
//! breaker for all tenants, protecting the shared dependency.

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum CircuitError<E>
where
    E: std::error::Error,
{
    /// The breaker is open; the wrapped operation was never invoked.
    #[error("dependency unavailable: circuit open for another {}s", remaining.as_secs().max(1))]
    Open {
        /// Time until the next probe will be admitted.
        remaining: Duration,
    },

    /// The wrapped operation ran and failed.
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug)]
struct BreakerState {
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    open: bool,
}

/// Inspectable snapshot of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerStats {
    pub open: bool,
    pub consecutive_failures: u32,
    /// Time until the next probe, when open and still cooling down.
    pub recovery_remaining: Option<Duration>,
}

/// Explicit stateful circuit breaker.
///
/// Closed until `failure_threshold` consecutive failures (any success
/// resets the counter). While open, calls inside the recovery window
/// fail fast without invoking the operation. The first call after the
/// window is admitted as a probe; admission re-arms the window so only
/// one probe passes at a time. A successful probe closes the breaker and
/// zeroes the counter; a failed probe keeps it open with a fresh clock.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_time: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            recovery_time,
            state: Mutex::new(BreakerState {
                consecutive_failures: 0,
                last_failure_at: None,
                open: false,
            }),
        }
    }

    /// Runs `op` through the breaker.
    pub async fn call<T, E, F, Fut>(&self, op: F) -> Result<T, CircuitError<E>>
    where
        E: std::error::Error,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(remaining) = self.admit() {
            debug!(remaining_s = remaining.as_secs(), "circuit open, failing fast");
            return Err(CircuitError::Open { remaining });
        }
        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(CircuitError::Inner(err))
            }
        }
    }

    /// Whether the breaker is currently open.
    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    /// Snapshot for the status surface.
    pub fn stats(&self) -> BreakerStats {
        let state = self.state.lock().unwrap();
        let recovery_remaining = if state.open {
            state
                .last_failure_at
                .map(|at| self.recovery_time.saturating_sub(at.elapsed()))
                .filter(|remaining| !remaining.is_zero())
        } else {
            None
        };
        BreakerStats {
            open: state.open,
            consecutive_failures: state.consecutive_failures,
            recovery_remaining,
        }
    }

    /// Returns the remaining cool-down when the call must fail fast.
    fn admit(&self) -> Option<Duration> {
        let mut state = self.state.lock().unwrap();
        if !state.open {
            return None;
        }
        let last = state.last_failure_at?;
        let elapsed = last.elapsed();
        if elapsed < self.recovery_time {
            return Some(self.recovery_time - elapsed);
        }
        // Recovery window elapsed: admit this call as the probe and
        // re-arm the clock so concurrent callers keep failing fast until
        // the probe resolves.
        state.last_failure_at = Some(Instant::now());
        None
    }

    fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        if state.open {
            debug!("circuit closing after successful probe");
        }
        state.consecutive_failures = 0;
        state.last_failure_at = None;
        state.open = false;
    }

    fn record_failure(&self) {
        let mut state = self.state.lock().unwrap();
        state.consecutive_failures += 1;
        state.last_failure_at = Some(Instant::now());
        if !state.open && state.consecutive_failures >= self.failure_threshold {
            warn!(
                failures = state.consecutive_failures,
                "circuit opening after consecutive failures"
            );
            state.open = true;
        }
    }
}
