//! Exponential backoff retry policy

use crate::HarvestError;
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};

/// Longest single delay the policy will ever produce
const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Retry policy with exponential backoff and a wall-clock budget
///
/// # Schedule
///
/// | Retry | Nominal delay |
/// |-------|---------------|
/// | 1 | `initial_interval` |
/// | 2 | `initial_interval * multiplier` |
/// | n | `initial_interval * multiplier^(n-1)`, capped by `max_interval` |
///
/// With `jitter` enabled each delay is drawn uniformly from zero to its
/// nominal value. No retry starts once `max_elapsed` has passed or
/// `max_attempts` attempts were made, and a delay never sleeps past the
/// remaining budget.
///
/// Only errors for which [`HarvestError::is_retryable`] holds are retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Option<Duration>,
    pub max_elapsed: Duration,
    pub max_attempts: Option<u32>,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            multiplier: 2.0,
            max_interval: None,
            max_elapsed: Duration::from_secs(60),
            max_attempts: None,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: Some(1),
            ..Self::default()
        }
    }

    /// Nominal (un-jittered) delay before retry number `retry + 1`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.min(i32::MAX as u32) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);

        let mut delay = if secs.is_finite() && secs < MAX_DELAY.as_secs_f64() {
            Duration::from_secs_f64(secs.max(0.0))
        } else {
            MAX_DELAY
        };

        if let Some(max_interval) = self.max_interval {
            delay = delay.min(max_interval);
        }
        delay
    }

    /// Delay before the next attempt, or None once the policy gives up
    ///
    /// # Arguments
    ///
    /// * `attempts_made` - Attempts already made, including the failed one
    /// * `elapsed` - Time since the first attempt started
    pub fn next_delay(&self, attempts_made: u32, elapsed: Duration) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| attempts_made >= max) {
            return None;
        }

        let remaining = self.max_elapsed.checked_sub(elapsed)?;
        if remaining.is_zero() {
            return None;
        }

        let delay = self.apply_jitter(self.delay_for(attempts_made.saturating_sub(1)));
        Some(delay.min(remaining))
    }

    /// Runs `operation` until it succeeds, fails permanently or the policy gives up
    ///
    /// The error of the last attempt is returned when retries are exhausted.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, HarvestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let error = match operation().await {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::debug!("{} succeeded after {} attempts", label, attempts);
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            match self.next_delay(attempts, start.elapsed()) {
                Some(delay) => {
                    tracing::warn!(
                        "Attempt {} for {} failed: {}; retrying in {}ms",
                        attempts,
                        label,
                        error,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::warn!(
                        "Giving up on {} after {} attempts ({:.1}s): {}",
                        label,
                        attempts,
                        start.elapsed().as_secs_f64(),
                        error
                    );
                    return Err(error);
                }
            }
        }
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let secs = rand::rng().random_range(0.0..=delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}
