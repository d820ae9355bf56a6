//! Amazon Rekognition label detection

use async_trait::async_trait;
use aws_sdk_rekognition::error::{DisplayErrorContext, SdkError};
use aws_sdk_rekognition::operation::detect_labels::DetectLabelsError;
use aws_sdk_rekognition::types::{Image, S3Object};
use aws_sdk_rekognition::Client as RekognitionClient;
use mediaquery_core::{Label, LabelDetectionSettings};
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::detector::LabelDetector;
use crate::error::DetectionError;

/// Calls `DetectLabels` with an S3 object reference; the image bytes never pass
/// through this process.
#[derive(Clone)]
pub struct RekognitionLabelDetector {
    client: RekognitionClient,
    min_confidence: Option<f32>,
    max_labels: Option<i32>,
}

impl Debug for RekognitionLabelDetector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RekognitionLabelDetector")
            .field("min_confidence", &self.min_confidence)
            .field("max_labels", &self.max_labels)
            .finish()
    }
}

impl RekognitionLabelDetector {
    pub fn new(client: RekognitionClient, settings: &LabelDetectionSettings) -> Self {
        Self {
            client,
            min_confidence: settings.min_confidence,
            max_labels: settings.max_labels,
        }
    }

    pub fn from_sdk_config(
        sdk_config: &aws_config::SdkConfig,
        settings: &LabelDetectionSettings,
    ) -> Self {
        Self::new(RekognitionClient::new(sdk_config), settings)
    }
}

#[async_trait]
impl LabelDetector for RekognitionLabelDetector {
    #[tracing::instrument(skip(self), fields(bucket = %bucket, key = %key))]
    async fn detect(&self, bucket: &str, key: &str) -> Result<Vec<Label>, DetectionError> {
        let start = std::time::Instant::now();

        let image = Image::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let response = self
            .client
            .detect_labels()
            .image(image)
            .set_min_confidence(self.min_confidence)
            .set_max_labels(self.max_labels)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let labels: Vec<Label> = response
            .labels()
            .iter()
            .filter_map(|label| {
                label.name().map(|name| Label {
                    name: name.to_string(),
                    confidence: label.confidence(),
                })
            })
            .collect();

        tracing::debug!(
            label_count = labels.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Rekognition labels detected"
        );

        Ok(labels)
    }
}

/// Throttling, capacity and transport problems are worth retrying; anything the
/// service rejected because of the request itself is not.
fn classify_sdk_error<R: Debug>(err: SdkError<DetectLabelsError, R>) -> DetectionError {
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            DetectionError::Transient(message)
        }
        SdkError::ServiceError(service_err) => match service_err.err() {
            DetectLabelsError::ThrottlingException(_)
            | DetectLabelsError::ProvisionedThroughputExceededException(_)
            | DetectLabelsError::InternalServerError(_) => DetectionError::Transient(message),
            _ => DetectionError::Rejected(message),
        },
        _ => DetectionError::Rejected(message),
    }
}
