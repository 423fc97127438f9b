use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{LlmError, ModelInvoker, ModelRequest};

/// Capped exponential backoff: `base_delay`, then 2×, 4×, ... between attempts,
/// stopping early once the next sleep would exceed `max_total_wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_total_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_total_wait: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// Runs `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or the policy is exhausted. The last error is returned.
pub async fn with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut waited = Duration::ZERO;
    let mut attempt = 1;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= policy.max_attempts || !is_retryable(&err) {
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        if waited + delay > policy.max_total_wait {
            warn!(label, attempt, "Retry budget exhausted: {err}");
            return Err(err);
        }

        warn!(
            "{} attempt {} failed, retrying after {}ms: {}",
            label,
            attempt,
            delay.as_millis(),
            err
        );
        tokio::time::sleep(delay).await;
        waited += delay;
        attempt += 1;
    }
}

/// Decorator applying a [`RetryPolicy`] to transient failures of any provider.
pub struct RetryingInvoker {
    inner: Box<dyn ModelInvoker>,
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(inner: Box<dyn ModelInvoker>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ModelInvoker for RetryingInvoker {
    async fn invoke(&self, request: &ModelRequest) -> Result<String, LlmError> {
        with_backoff(
            &self.policy,
            self.inner.model_id(),
            LlmError::is_transient,
            || self.inner.invoke(request),
        )
        .await
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
