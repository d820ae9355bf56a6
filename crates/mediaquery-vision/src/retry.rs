//! Timeout and retry wrapper for label detectors

use async_trait::async_trait;
use mediaquery_core::{Label, LabelDetectionSettings};
use std::time::Duration;

use crate::detector::LabelDetector;
use crate::error::DetectionError;

/// Base delay for the first retry
pub const BASE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Upper bound on the delay between two attempts
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Bound on a single attempt
    pub attempt_timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&LabelDetectionSettings::default())
    }
}

impl From<&LabelDetectionSettings> for RetryPolicy {
    fn from(settings: &LabelDetectionSettings) -> Self {
        Self {
            attempt_timeout: settings.timeout,
            max_retries: settings.max_retries,
            base_delay: BASE_RETRY_DELAY,
            max_delay: MAX_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Applies a [`RetryPolicy`] to every call of the wrapped detector
pub struct RetryingDetector<D> {
    inner: D,
    policy: RetryPolicy,
}

impl<D: LabelDetector> RetryingDetector<D> {
    pub fn new(inner: D, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    async fn attempt(&self, bucket: &str, key: &str) -> Result<Vec<Label>, DetectionError> {
        match tokio::time::timeout(self.policy.attempt_timeout, self.inner.detect(bucket, key))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DetectionError::Timeout(self.policy.attempt_timeout)),
        }
    }
}

#[async_trait]
impl<D: LabelDetector> LabelDetector for RetryingDetector<D> {
    async fn detect(&self, bucket: &str, key: &str) -> Result<Vec<Label>, DetectionError> {
        let mut attempt = 0;
        loop {
            match self.attempt(bucket, key).await {
                Ok(labels) => return Ok(labels),
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        bucket = %bucket,
                        key = %key,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Label detection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(
                        bucket = %bucket,
                        key = %key,
                        attempts = attempt + 1,
                        error = %err,
                        "Label detection failed"
                    );
                    return Err(err);
                }
            }
        }
    }
}
