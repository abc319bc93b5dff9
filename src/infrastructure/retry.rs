//! Bounded retry with exponential backoff, shared by the API clients.
//!
//! Only errors classified as retryable are retried; a 4xx fails the call
//! immediately. When the service supplied a Retry-After delay, that delay
//! wins over the computed backoff. Exhausting the attempt budget collapses
//! the last error into `ServiceUnavailable`.

use std::time::Duration;
use tokio::time::sleep;

use crate::domain::config::RetryConfig;
use crate::domain::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Same settings, different attempt budget.
    pub fn with_max_attempts(&self, max_attempts: usize) -> Self {
        Self::new(max_attempts, self.base_delay, self.max_delay)
    }

    /// Execute an operation, retrying retryable failures with backoff.
    pub async fn run<F, Fut, T>(&self, what: &str, operation: F) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ApiResult<T>>,
    {
        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{what}: request succeeded on attempt {attempt}");
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) => {
                    if attempt == self.max_attempts {
                        tracing::warn!("{what}: giving up after {attempt} attempts: {error}");
                        return Err(ApiError::ServiceUnavailable);
                    }
                    let delay = self.delay_for(attempt, &error);
                    tracing::warn!(
                        "{what}: attempt {attempt}/{} failed ({error}), retrying in {delay:?}",
                        self.max_attempts
                    );
                    sleep(delay).await;
                }
            }
        }
        Err(ApiError::ServiceUnavailable)
    }

    /// Delay before the attempt following `attempt` (1-based).
    fn delay_for(&self, attempt: usize, error: &ApiError) -> Duration {
        if let ApiError::RateLimited {
            retry_after: Some(indicated),
        } = error
        {
            return (*indicated).min(self.max_delay);
        }

        // base_delay * 2^(attempt-1), capped
        let exponent = (attempt as u32 - 1).min(16);
        self.base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }
}
