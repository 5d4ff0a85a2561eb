//! Retry executor for engine calls.
//!
//! A [`RetryPolicy`] runs one asynchronous operation up to `max_attempts`
//! times with a linear backoff: before retry *i* (1-indexed) it waits
//! `i × delay_unit`. Attempts never overlap. A predicate decides which
//! errors are worth another attempt, and a [`CancellationToken`] aborts
//! both an in-flight attempt and a pending backoff sleep.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default number of attempts for a single logical call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Outcome of a call that did not succeed.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The last observed error, after attempts were exhausted or the
    /// predicate refused to retry.
    Failed(E),
    /// The cancellation token fired.
    Cancelled,
}

impl<E> RetryError<E> {
    /// Returns the operation error, if any.
    pub fn into_failed(self) -> Option<E> {
        match self {
            RetryError::Failed(err) => Some(err),
            RetryError::Cancelled => None,
        }
    }
}

/// Linear backoff retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Creates a policy with a one second delay unit.
    ///
    /// A `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_unit: Duration::from_secs(1),
        }
    }

    /// Sets the delay unit multiplied by the retry index.
    pub fn with_delay_unit(mut self, delay_unit: Duration) -> Self {
        self.delay_unit = delay_unit;
        self
    }

    /// Returns the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the wait before retry number `retry` (1-indexed).
    pub fn delay_before(&self, retry: u32) -> Duration {
        self.delay_unit * retry
    }

    /// Runs `operation` until it succeeds, the predicate refuses the error,
    /// attempts are exhausted, or `cancel` fires.
    pub async fn execute<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        should_retry: P,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                result = operation() => result,
            };

            match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempts = attempt, "Engine call succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if attempt >= self.max_attempts || !should_retry(&e) {
                        return Err(RetryError::Failed(e));
                    }

                    let delay = self.delay_before(attempt);
                    warn!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Engine call failed, retrying"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}
