//! Retry policy with exponential backoff and jittered delays
//!
//! Wraps a fallible async operation with bounded retries. Jitter comes from a
//! caller-supplied RNG rather than the wall clock so that backoff timing is
//! reproducible under test.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::{Error, Result};

/// Configuration for retrying a status fetch
///
/// Supports exponential backoff with jitter to avoid synchronized retries.
///
/// # Example
///
/// ```
/// use spacewatch_core::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default()
///     .with_max_attempts(5)
///     .with_base_delay(Duration::from_secs(1))
///     .with_overall_deadline(Duration::from_secs(15));
///
/// // First retry after ~2 seconds
/// // Second retry after ~4 seconds
/// // etc., until the overall deadline cuts the whole call off
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial one), at least 1
    pub max_attempts: u32,

    /// Base unit for the exponential delay
    pub base_delay: Duration,

    /// Hard timeout applied to each individual fetch attempt
    pub per_attempt_timeout: Duration,

    /// Bound on the whole call, retries and delays included
    pub overall_deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            per_attempt_timeout: Duration::from_secs(10),
            overall_deadline: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts (clamped to at least 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base delay unit
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_per_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.per_attempt_timeout = timeout;
        self
    }

    /// Set the overall deadline
    pub fn with_overall_deadline(mut self, deadline: Duration) -> Self {
        self.overall_deadline = deadline;
        self
    }

    /// Calculate the delay after a failed attempt (1-based)
    ///
    /// `2^attempt * base_delay` plus a fractional second of jitter drawn from
    /// the supplied RNG.
    pub fn delay_after_attempt<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        let jitter = Duration::from_secs_f64(rng.gen_range(0.0..1.0));
        backoff + jitter
    }

    /// Run `op` under this policy.
    ///
    /// Retries retryable failures up to `max_attempts` times with exponential
    /// backoff, emitting a warning per failed attempt. Non-retryable errors
    /// and the final failure propagate unchanged. The whole call is bounded by
    /// `overall_deadline`; when it elapses the in-flight attempt is dropped
    /// and the call fails with [`Error::DeadlineExceeded`].
    pub async fn run<T, R, F, Fut>(&self, rng: &mut R, mut op: F) -> Result<T>
    where
        R: Rng + ?Sized,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = async {
            let mut attempt = 1u32;
            loop {
                match op().await {
                    Ok(value) => return Ok(value),
                    Err(err) if !err.is_retryable() || attempt >= self.max_attempts => {
                        return Err(err);
                    }
                    Err(err) => {
                        let delay = self.delay_after_attempt(attempt, &mut *rng);
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "attempt failed, retrying after backoff"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                }
            }
        };

        match tokio::time::timeout(self.overall_deadline, attempts).await {
            Ok(result) => result,
            Err(_) => Err(Error::DeadlineExceeded(self.overall_deadline)),
        }
    }
}
