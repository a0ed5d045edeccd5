//! Bounded retry with exponential backoff and jitter.

use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::config::IndexerConfig;
use crate::error::HearthError;

/// Exponential backoff: `initial * 2^attempt`, capped at `max`, with the
/// actual delay drawn from the upper half of that window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Backoff {
            initial,
            max: max.max(initial),
        }
    }

    pub fn from_config(config: &IndexerConfig) -> Self {
        Self::new(config.initial_backoff(), config.max_backoff())
    }

    /// The delay window before retry number `attempt` (zero-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.initial.saturating_mul(factor).min(self.max)
    }

    /// A jittered delay in `[ceiling / 2, ceiling]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt).as_millis() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        let millis = rand::rng().random_range(ceiling / 2..=ceiling);
        Duration::from_millis(millis)
    }
}

/// The last error of a failed retry loop.
#[derive(Debug)]
pub struct Exhausted {
    pub error: HearthError,
    /// Attempts made, including the first.
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or has been
/// retried `max_retries` times. `op` receives the zero-based attempt number.
pub fn retry<T, F>(backoff: &Backoff, max_retries: u32, mut op: F) -> Result<T, Exhausted>
where
    F: FnMut(u32) -> crate::error::Result<T>,
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < max_retries => {
                let delay = backoff.delay(attempt);
                tracing::debug!(attempt, ?delay, error = %error, "retrying index write");
                thread::sleep(delay);
                attempt += 1;
            }
            Err(error) => {
                return Err(Exhausted {
                    error,
                    attempts: attempt + 1,
                });
            }
        }
    }
}
