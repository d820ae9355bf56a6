//! Media Query ingest
//!
//! Storage notifications arrive on an SQS queue as S3 event JSON. [`EventConsumer`]
//! long-polls the queue, decodes each message into [`StorageNotification`]s and hands
//! them to the [`EventRouter`], which calls the label detector and the catalog store.
//! A message is deleted from the queue only after every notification in it succeeded;
//! otherwise it becomes visible again and is redelivered.

pub mod consumer;
pub mod error;
pub mod notification;
pub mod queue;
pub mod router;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use consumer::{BatchSummary, ConsumerSettings, EventConsumer, EventConsumerHandle};
pub use error::QueueError;
pub use notification::{parse_notification_body, StorageEventKind, StorageNotification};
pub use queue::{NotificationQueue, QueueMessage, SqsNotificationQueue};
pub use router::{EventRouter, RouteOutcome};
