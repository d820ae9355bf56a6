//! Media Query label detection
//!
//! [`LabelDetector`] is the seam between the ingest path and the vision service.
//! [`RekognitionLabelDetector`] calls Amazon Rekognition `DetectLabels` against an S3
//! object; [`RetryingDetector`] wraps any detector with a per-attempt timeout and
//! capped exponential backoff for retryable failures.

pub mod detector;
pub mod error;
pub mod rekognition;
pub mod retry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use detector::LabelDetector;
pub use error::DetectionError;
pub use rekognition::RekognitionLabelDetector;
pub use retry::{RetryPolicy, RetryingDetector};
