//! Per-actor rate limiting.
//!
//! A rule table maps action names to window limits. Records are created
//! lazily on first use and evicted by a periodic sweep once both the
//! window and any block have expired, bounding memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval};
use tracing::{debug, trace};

/// Limit for one action name.
#[derive(Debug, Clone)]
pub struct RateLimitRule {
    /// Attempts allowed inside one window.
    pub max_attempts: u32,

    /// Window length.
    pub window: Duration,

    /// Optional penalty applied when the limit is exceeded; without it,
    /// rejections last until the window resets.
    pub block_duration: Option<Duration>,
}

/// Typed rejection carrying the time until the next allowed attempt.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("rate limited: retry in {}s", retry_after.as_secs().max(1))]
pub struct RateLimitError {
    pub retry_after: Duration,
}

#[derive(Debug)]
struct RateLimitRecord {
    count: u32,
    window_reset_at: Instant,
    blocked_until: Option<Instant>,
}

impl RateLimitRecord {
    fn expired(&self, now: Instant) -> bool {
        now >= self.window_reset_at && self.blocked_until.is_none_or(|until| now >= until)
    }
}

/// Introspection for one (actor, action) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub count: u32,
    pub remaining_attempts: u32,
    pub window_resets_in: Duration,
    pub blocked_for: Option<Duration>,
}

/// Aggregate counters for the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterStats {
    pub rules: usize,
    pub tracked_records: usize,
    pub currently_blocked: usize,
}

/// Per-actor rate limiter.
///
/// Check-and-increment is atomic per key: all records live behind one
/// mutex, so two concurrent callers cannot both observe a pre-increment
/// count and slip past the limit.
#[derive(Debug)]
pub struct RateLimiter {
    rules: HashMap<String, RateLimitRule>,
    records: Mutex<HashMap<(String, String), RateLimitRecord>>,
}

impl RateLimiter {
    pub fn new(rules: HashMap<String, RateLimitRule>) -> Self {
        Self {
            rules,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Records an attempt by `actor` at `action`.
    ///
    /// Actions with no rule are allowed unconditionally. Rejections carry
    /// the remaining block or window time.
    pub fn check(&self, actor: &str, action: &str) -> Result<(), RateLimitError> {
        let Some(rule) = self.rules.get(action) else {
            return Ok(());
        };
        let now = Instant::now();
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry((actor.to_string(), action.to_string()))
            .or_insert_with(|| RateLimitRecord {
                count: 0,
                window_reset_at: now + rule.window,
                blocked_until: None,
            });

        if let Some(until) = record.blocked_until {
            if now < until {
                return Err(RateLimitError {
                    retry_after: until - now,
                });
            }
            record.blocked_until = None;
        }

        if now >= record.window_reset_at {
            record.count = 1;
            record.window_reset_at = now + rule.window;
            return Ok(());
        }

        record.count += 1;
        if record.count > rule.max_attempts {
            let retry_after = if let Some(block) = rule.block_duration {
                record.blocked_until = Some(now + block);
                debug!(actor, action, block_s = block.as_secs(), "rate limit block applied");
                block
            } else {
                record.window_reset_at - now
            };
            return Err(RateLimitError { retry_after });
        }
        Ok(())
    }

    /// Current record for an (actor, action) pair, if one is tracked.
    pub fn status(&self, actor: &str, action: &str) -> Option<RateLimitStatus> {
        let rule = self.rules.get(action)?;
        let now = Instant::now();
        let records = self.records.lock().unwrap();
        let record = records.get(&(actor.to_string(), action.to_string()))?;
        Some(RateLimitStatus {
            count: record.count,
            remaining_attempts: rule.max_attempts.saturating_sub(record.count),
            window_resets_in: record.window_reset_at.saturating_duration_since(now),
            blocked_for: record
                .blocked_until
                .map(|until| until.saturating_duration_since(now))
                .filter(|remaining| !remaining.is_zero()),
        })
    }

    /// Aggregate counters across all tracked records.
    pub fn statistics(&self) -> RateLimiterStats {
        let now = Instant::now();
        let records = self.records.lock().unwrap();
        RateLimiterStats {
            rules: self.rules.len(),
            tracked_records: records.len(),
            currently_blocked: records
                .values()
                .filter(|record| record.blocked_until.is_some_and(|until| now < until))
                .count(),
        }
    }

    /// Drops records whose window and block have both expired.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, record| !record.expired(now));
        let evicted = before - records.len();
        if evicted > 0 {
            trace!(evicted, remaining = records.len(), "rate limit records swept");
        }
    }

    /// Spawns the periodic eviction task.
    ///
    /// The returned handle stops the task explicitly (or on drop), so
    /// shutdown and tests control its lifecycle.
    pub fn start_sweep(self: &Arc<Self>, period: Duration) -> SweepHandle {
        let limiter = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut tick = interval(period);
            // The first tick fires immediately; skip it.
            tick.tick().await;
            loop {
                tick.tick().await;
                limiter.sweep();
            }
        });
        SweepHandle { task }
    }
}

/// Handle to the background sweep task.
#[derive(Debug)]
pub struct SweepHandle {
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stops the sweep task.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
