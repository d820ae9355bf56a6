//! Queue and decoding errors

use mediaquery_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("failed to receive messages: {0}")]
    Receive(String),

    #[error("failed to acknowledge message: {0}")]
    Ack(String),

    /// The message body is not a storage notification we understand
    #[error("malformed notification: {0}")]
    Malformed(String),
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Malformed(message) => AppError::InvalidInput(message),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Malformed(err.to_string())
    }
}
