//! Bounded retry with a fixed backoff interval.

use log::{debug, warn};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL_MS};

/// Attempt budget and the fixed wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS),
        )
    }
}

/// Runs `operation` until it succeeds or the attempt budget is spent.
///
/// Every failure is retried the same way: wait `policy.interval()`, then call
/// again. Once only one attempt remains its failure is returned as-is. A budget
/// of zero still makes a single attempt.
pub async fn retry_max<F, Fut, T, E>(
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut remaining = policy.max_attempts;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                debug!("{}: succeeded on attempt {}", operation_name, attempt);
                return Ok(result);
            }
            Err(e) if remaining > 1 => {
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                    operation_name,
                    attempt,
                    policy.max_attempts,
                    e,
                    policy.interval.as_millis()
                );
                remaining -= 1;
                attempt += 1;
                tokio::time::sleep(policy.interval).await;
            }
            Err(e) => {
                debug!("{}: giving up after {} attempts", operation_name, attempt);
                return Err(e);
            }
        }
    }
}
