//! Label detection errors

use mediaquery_core::AppError;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// The attempt did not complete within the configured timeout
    #[error("label detection timed out after {0:?}")]
    Timeout(Duration),

    /// Throttling, transport failures and service-side 5xx
    #[error("label detection service unavailable: {0}")]
    Transient(String),

    /// The service refused the request (missing object, unsupported image, access denied)
    #[error("label detection rejected: {0}")]
    Rejected(String),
}

impl DetectionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DetectionError::Timeout(_) | DetectionError::Transient(_))
    }
}

impl From<DetectionError> for AppError {
    fn from(err: DetectionError) -> Self {
        AppError::LabelDetectionFailed(err.to_string())
    }
}
