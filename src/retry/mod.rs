//! Bounded retry with exponential backoff
//!
//! Every transient operation in a run (page fetch, expansion wait, delayed
//! compendium render) is wrapped in a [`RetryPolicy`] independently, so one
//! node exhausting its attempts never disturbs its siblings. The crawl loop
//! downgrades exhaustion to a logged skip; only setup and authentication
//! failures are allowed to abort a run.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a retried operation
#[derive(Debug, Error)]
pub enum RetryError<E: Display> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("cancelled while retrying")]
    Cancelled,
}

/// Wraps fallible async operations with bounded attempts and backoff
///
/// Backoff between attempt `n` and `n+1` is `2^n * base_delay` (attempt
/// index 0-based). The shared cancellation flag is checked before
/// every attempt and again before every backoff sleep, so cancellation
/// latency is bounded by one in-flight operation plus one backoff delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    cancel: Arc<AtomicBool>,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt bound and backoff unit
    ///
    /// `max_attempts` counts invocations of the operation, not retries:
    /// a policy with `max_attempts = 3` runs the operation at most three
    /// times. Values below 1 are clamped to 1.
    pub fn new(max_attempts: u32, base_delay: Duration, cancel: Arc<AtomicBool>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            cancel,
        }
    }

    /// Returns the backoff delay before retry number `attempt` (0-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        // Cap the shift so a misconfigured attempt count cannot overflow.
        self.base_delay.saturating_mul(1u32 << attempt.min(20))
    }

    /// Runs `op` until it succeeds, attempts are exhausted, or the run is
    /// cancelled
    ///
    /// `what` and `target` only feed diagnostics ("retry attempt N for
    /// operation X on URL Y"). The last error is surfaced to the caller on
    /// exhaustion, never swallowed.
    pub async fn run<T, E, F, Fut>(
        &self,
        what: &str,
        target: &str,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0u32;
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(RetryError::Cancelled);
            }

            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} on {} succeeded after {} retries", what, target, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        warn!(
                            "{} on {} failed after {} attempts: {}",
                            what, target, attempt, e
                        );
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }

                    let delay = self.backoff_delay(attempt - 1);
                    warn!(
                        "Retry attempt {} for {} on {}: {} (backing off {:?})",
                        attempt, what, target, e, delay
                    );

                    if self.cancel.load(Ordering::Relaxed) {
                        return Err(RetryError::Cancelled);
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
