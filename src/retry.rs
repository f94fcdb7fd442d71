//! Fixed-delay retry for operations that depend on server-side processing,
//! such as fetching a document that may not have been generated yet.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

/// Number of attempts made to fetch a generated document.
pub const DOWNLOAD_ATTEMPTS: usize = 2;

/// Delay before every attempt, in seconds.
pub const RETRY_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DOWNLOAD_ATTEMPTS,
            delay: Duration::from_secs(RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

/// Runs `operation` up to `policy.attempts` times (at least once), sleeping
/// `policy.delay` before each attempt. No backoff: every wait is the same.
/// Returns the first success, or the error of the last attempt.
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T, E>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        if !policy.delay.is_zero() {
            debug!(
                "{}: waiting {}s before attempt {}/{}",
                operation_name,
                policy.delay.as_secs_f64(),
                attempt,
                attempts
            );
            tokio::time::sleep(policy.delay).await;
        }

        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {}s...",
                    operation_name,
                    attempt,
                    attempts,
                    e,
                    policy.delay.as_secs()
                );
                attempt += 1;
            }
            Err(e) => {
                warn!(
                    "{}: attempt {}/{} failed ({})",
                    operation_name, attempt, attempts, e
                );
                return Err(e);
            }
        }
    }
}
