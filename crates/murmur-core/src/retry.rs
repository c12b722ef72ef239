//! Per-call timeout with a bounded retry budget.
//!
//! Both external capabilities (embedding and labeling) share the same
//! discipline: every attempt runs under its own timeout, failed attempts are
//! retried immediately up to `max_retries` times, and exhausting the budget
//! is an ordinary error for the caller to handle.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

/// Timeout and retry budget for one external call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Deadline for each individual attempt.
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries,
            timeout,
        }
    }
}

/// Why the final attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError<E> {
    TimedOut(Duration),
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::TimedOut(d) => write!(f, "timed out after {:.3}s", d.as_secs_f64()),
            AttemptError::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// Result of a retried call.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    pub result: Result<T, AttemptError<E>>,
    /// Number of attempts made (1 = no retries needed).
    pub attempts: u32,
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, AttemptError<E>> {
        self.result
    }
}

/// Run `operation` until it succeeds or the budget is spent.
///
/// The closure receives the zero-based attempt number. Each attempt is
/// wrapped in `tokio::time::timeout`; there is no delay between attempts.
pub async fn execute_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> RetryResult<T, E>
where
    E: fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let mut last_error = AttemptError::TimedOut(policy.timeout);

    for attempt in 0..=policy.max_retries {
        match tokio::time::timeout(policy.timeout, operation(attempt)).await {
            Ok(Ok(value)) => {
                return RetryResult {
                    result: Ok(value),
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                };
            }
            Ok(Err(e)) => {
                debug!(attempt, error = %e, "attempt failed");
                last_error = AttemptError::Failed(e);
            }
            Err(_) => {
                debug!(attempt, timeout_ms = policy.timeout.as_millis() as u64, "attempt timed out");
                last_error = AttemptError::TimedOut(policy.timeout);
            }
        }
    }

    RetryResult {
        result: Err(last_error),
        attempts: policy.max_retries + 1,
        total_duration: start.elapsed(),
    }
}
