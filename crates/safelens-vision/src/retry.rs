//! Bounded retry with exponential backoff around any classifier
//!
//! Every attempt runs under its own timeout. Only transient failures are
//! retried (see [`VisionError::is_transient`]); the last error is returned
//! once the attempts are spent.

use async_trait::async_trait;
use safelens_core::{SafeSearchResult, VisionConfig};
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::{ImageSource, SafeSearchClassifier};
use crate::error::VisionError;

const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Retry behaviour for classifier calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each one after
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound for a single attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &VisionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.retry_base_delay,
            max_delay: MAX_BACKOFF.max(config.retry_base_delay),
            attempt_timeout: config.timeout,
        }
    }

    /// Delay after the given failed attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: MAX_BACKOFF,
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

/// Wraps a classifier with [`RetryPolicy`]
#[derive(Debug)]
pub struct RetryingClassifier {
    inner: Arc<dyn SafeSearchClassifier>,
    policy: RetryPolicy,
}

impl RetryingClassifier {
    pub fn new(inner: Arc<dyn SafeSearchClassifier>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl SafeSearchClassifier for RetryingClassifier {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn classify(&self, image: ImageSource) -> Result<SafeSearchResult, VisionError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let outcome = match tokio::time::timeout(
                self.policy.attempt_timeout,
                self.inner.classify(image.clone()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(VisionError::Timeout(self.policy.attempt_timeout)),
            };

            let err = match outcome {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::debug!(
                            classifier = self.inner.name(),
                            attempts = attempt,
                            "Classification succeeded after retries"
                        );
                    }
                    return Ok(result);
                }
                Err(err) => err,
            };

            if !err.is_transient() {
                tracing::debug!(
                    classifier = self.inner.name(),
                    attempts = attempt,
                    error = %err,
                    "Classification failed with non-retryable error"
                );
                return Err(err);
            }

            if attempt >= self.policy.max_attempts {
                tracing::warn!(
                    classifier = self.inner.name(),
                    attempts = attempt,
                    max_attempts = self.policy.max_attempts,
                    error = %err,
                    "Classification failed after max attempts"
                );
                return Err(err);
            }

            let delay = self.policy.delay_for_attempt(attempt);
            tracing::warn!(
                classifier = self.inner.name(),
                attempt = attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Classification failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
