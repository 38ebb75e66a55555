//! Retry with exponential backoff.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

/// Backoff configuration.
///
/// The delay before attempt `k` (for `k >= 2`) is
/// `min(base_delay * exponential_base^(k-2), max_delay)`, optionally
/// perturbed by +-25% jitter. No delay follows the final attempt.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryOptions {
    /// Delay to sleep before the given attempt number (1-based, `>= 2`).
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "delays are far below the precision limits of f64"
    )]
    fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2);
        let scaled = self.base_delay.as_millis() as f64 * self.exponential_base.powi(exponent as i32);
        let capped = scaled.min(self.max_delay.as_millis() as f64);
        let millis = if self.jitter {
            capped * rand::thread_rng().gen_range(0.75..=1.25)
        } else {
            capped
        };
        Duration::from_millis(millis.round() as u64)
    }
}

/// Invokes `op` up to `opts.max_attempts` times, sleeping between
/// attempts per the backoff schedule.
///
/// Only errors for which `should_retry` returns true are retried; any
/// other error propagates immediately, as does the error of the final
/// attempt.
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    mut op: F,
    should_retry: C,
    opts: &RetryOptions,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let max_attempts = opts.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && should_retry(&err) => {
                let delay = opts.delay_before(attempt + 1);
                tracing::debug!(attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "retrying after failure");
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// HTTP-specialized retry.
///
/// Transport errors and responses with status >= 500 are retried; any
/// other response (2xx, 3xx, 4xx) is returned unchanged so callers can
/// branch on status without triggering retries for client errors. After
/// the final attempt the last 5xx response (or transport error) is also
/// returned unchanged.
pub async fn retry_request<F, Fut>(
    mut send: F,
    opts: &RetryOptions,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let max_attempts = opts.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let outcome = send().await;
        let retryable = match &outcome {
            Ok(response) => response.status().is_server_error(),
            Err(_) => true,
        };
        if !retryable || attempt >= max_attempts {
            return outcome;
        }
        let delay = opts.delay_before(attempt + 1);
        match &outcome {
            Ok(response) => tracing::debug!(
                attempt,
                status = response.status().as_u16(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying server error"
            ),
            Err(err) => tracing::debug!(
                attempt,
                error = %err,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying transport error"
            ),
        }
        sleep(delay).await;
        attempt += 1;
    }
}
