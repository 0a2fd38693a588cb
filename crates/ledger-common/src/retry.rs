//! Bounded retries with clamped exponential backoff.

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

/// Default number of attempts per call site (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base unit of the exponential backoff.
pub const DEFAULT_MULTIPLIER: Duration = Duration::from_secs(1);

/// Lower bound applied to every backoff delay.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(4);

/// Upper bound applied to every backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Classifies an error as transient (worth another attempt) or permanent.
pub trait Retryable {
    /// Returns whether this error is potentially recoverable with a retry.
    fn is_retryable(&self) -> bool;
}

/// Function used to block between attempts.
pub type Sleeper = fn(Duration);

/// Sleeper that returns immediately.
pub fn no_sleep(_delay: Duration) {}

/// Retry policy applied to a single call site.
///
/// The wait after attempt `n` is `multiplier * 2^(n-1)` clamped to
/// `[min_delay, max_delay]`, without jitter. With the defaults this yields
/// 4s, 4s, 4s, 8s, 10s, 10s, ...
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Base unit of the exponential growth.
    pub multiplier: Duration,
    /// Lower clamp for each delay.
    pub min_delay: Duration,
    /// Upper clamp for each delay.
    pub max_delay: Duration,
    sleeper: Sleeper,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            multiplier: DEFAULT_MULTIPLIER,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            sleeper: std::thread::sleep,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("multiplier", &self.multiplier)
            .field("min_delay", &self.min_delay)
            .field("max_delay", &self.max_delay)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Policy that runs the operation exactly once.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Policy with `max_attempts` attempts and no waiting between them.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            sleeper: no_sleep,
        }
    }

    /// Set the number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the backoff parameters.
    #[must_use]
    pub fn with_backoff(mut self, multiplier: Duration, min: Duration, max: Duration) -> Self {
        self.multiplier = multiplier;
        self.min_delay = min;
        self.max_delay = max.max(min);
        self
    }

    /// Replace the function used to wait between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Effective number of attempts.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let raw = 2u32
            .checked_pow(exponent)
            .and_then(|factor| self.multiplier.checked_mul(factor))
            .unwrap_or(self.max_delay);
        raw.clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }

    /// Run `op`, retrying transient failures.
    ///
    /// Permanent errors (see [`Retryable`]) are returned on the first
    /// failure. After the last attempt the final error is returned as-is.
    pub fn run<T, E, F>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let max_attempts = self.attempts();
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_retryable() => {
                    debug!(operation, attempt, %error, "permanent failure, not retrying");
                    return Err(error);
                }
                Err(error) if attempt >= max_attempts => {
                    warn!(operation, attempt, %error, "giving up after final attempt");
                    return Err(error);
                }
                Err(error) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %error,
                        "attempt failed, retrying"
                    );
                    (self.sleeper)(delay);
                    attempt += 1;
                }
            }
        }
    }
}
