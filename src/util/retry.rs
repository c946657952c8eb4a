//! Bounded retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::KeywardError;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts (at least one) and default backoff.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. `label` names the operation in logs.
    pub async fn execute<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, KeywardError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, KeywardError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() || attempt >= attempts {
                return Err(err);
            }

            let delay = jittered(backoff, rand_factor());
            tracing::warn!(
                operation = label,
                attempt,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying after error"
            );
            tokio::time::sleep(delay).await;
            backoff = self.next_backoff(backoff);
        }
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        Duration::from_secs_f64(
            (current.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64()),
        )
    }
}

/// Scale `backoff` into the 75%–125% band using `factor` in [0, 1).
fn jittered(backoff: Duration, factor: f64) -> Duration {
    Duration::from_secs_f64(backoff.as_secs_f64() * (0.75 + factor * 0.5))
}

/// Pseudo-random factor in [0, 1) from the clock and thread id.
fn rand_factor() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);
    (hasher.finish() % 10_000) as f64 / 10_000.0
}
