//! Generic resilience wrappers for remote dependencies.
//!
//! Three pieces, none of which knows anything about issue trackers:
//! - Retry with exponential backoff, plus an HTTP-specialized variant
//! - A circuit breaker, one instance per logical remote dependency
//! - A per-actor rate limiter with a startable/stoppable sweep task
//!
//! All timing goes through `tokio::time`, so tests drive these under
//! paused time.

mod breaker;
mod limiter;
mod retry;

pub use breaker::{BreakerStats, CircuitBreaker, CircuitError};
pub use limiter::{
    RateLimitError, RateLimitRule, RateLimitStatus, RateLimiter, RateLimiterStats, SweepHandle,
};
pub use retry::{RetryOptions, retry_request, retry_with_backoff};
