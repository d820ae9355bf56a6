//! Notification queue abstraction and its SQS implementation

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client as SqsClient;

use crate::error::QueueError;

/// A message received from the queue, not yet acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    /// Handle used to delete the message; valid for this delivery only
    pub receipt_handle: String,
    pub body: String,
}

/// At-least-once message source. Unacknowledged messages are redelivered by the queue.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Wait up to `wait_time_seconds` for up to `max_messages` messages
    async fn receive(
        &self,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Remove a processed message so it is not delivered again
    async fn ack(&self, message: &QueueMessage) -> Result<(), QueueError>;
}

#[derive(Clone)]
pub struct SqsNotificationQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsNotificationQueue {
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig, queue_url: impl Into<String>) -> Self {
        Self::new(SqsClient::new(sdk_config), queue_url)
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl NotificationQueue for SqsNotificationQueue {
    async fn receive(
        &self,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let start = std::time::Instant::now();

        let result = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages.clamp(1, 10))
            .wait_time_seconds(wait_time_seconds)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!(queue_url = %self.queue_url, error = %message, "Failed to receive messages");
                QueueError::Receive(message)
            })?;

        let mut messages = Vec::new();
        for sqs_msg in result.messages() {
            let Some(receipt_handle) = sqs_msg.receipt_handle() else {
                tracing::warn!(
                    message_id = ?sqs_msg.message_id(),
                    "Received message without receipt handle, skipping"
                );
                continue;
            };
            messages.push(QueueMessage {
                message_id: sqs_msg.message_id().unwrap_or_default().to_string(),
                receipt_handle: receipt_handle.to_string(),
                body: sqs_msg.body().unwrap_or_default().to_string(),
            });
        }

        tracing::debug!(
            message_count = messages.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Messages received"
        );
        Ok(messages)
    }

    async fn ack(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt_handle)
            .send()
            .await
            .map_err(|e| {
                let error = DisplayErrorContext(&e).to_string();
                tracing::error!(
                    message_id = %message.message_id,
                    error = %error,
                    "Failed to delete message"
                );
                QueueError::Ack(error)
            })?;

        tracing::debug!(message_id = %message.message_id, "Message acknowledged");
        Ok(())
    }
}
