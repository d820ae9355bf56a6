use async_trait::async_trait;
use mediaquery_core::Label;

use crate::error::DetectionError;

/// Extracts descriptive labels from an object already present in storage
#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Detect labels for `key` in `bucket`. Labels are returned in the order the
    /// service reports them and may be empty. Object existence is not checked locally.
    async fn detect(&self, bucket: &str, key: &str) -> Result<Vec<Label>, DetectionError>;
}
