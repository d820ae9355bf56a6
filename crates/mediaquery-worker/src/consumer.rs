//! Queue consumer loop
//!
//! Shutdown: [`EventConsumerHandle::shutdown`] stops the loop from polling again and
//! waits for the batch in progress to finish. A long poll that is still waiting is
//! abandoned; nothing was received by it, so nothing is lost.

use futures::future::join_all;
use mediaquery_core::QueueSettings;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::QueueError;
use crate::notification::{parse_notification_body, StorageNotification};
use crate::queue::{NotificationQueue, QueueMessage};
use crate::router::{EventRouter, RouteOutcome};

/// Maximum pause after a failed receive. Caps exponential backoff so a queue outage
/// is retried at least this often.
pub const MAX_RECEIVE_BACKOFF: Duration = Duration::from_secs(30);

/// Delay after `consecutive_failures` failed receives (exponential with cap)
pub(crate) fn compute_receive_backoff(consecutive_failures: u32) -> Duration {
    Duration::from_secs(2_u64.saturating_pow(consecutive_failures.min(16))).min(MAX_RECEIVE_BACKOFF)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerSettings {
    pub max_messages: i32,
    pub wait_time_seconds: i32,
}

impl From<&QueueSettings> for ConsumerSettings {
    fn from(settings: &QueueSettings) -> Self {
        Self {
            max_messages: settings.max_messages,
            wait_time_seconds: settings.wait_time_seconds,
        }
    }
}

/// Result of one receive-and-process cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub received: usize,
    /// Fully processed and deleted from the queue
    pub acknowledged: usize,
    /// Left on the queue for redelivery
    pub failed: usize,
    /// Undecodable, deleted without processing
    pub discarded: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum MessageOutcome {
    Acknowledged,
    Failed,
    Discarded,
}

pub struct EventConsumer {
    queue: Arc<dyn NotificationQueue>,
    router: Arc<EventRouter>,
    settings: ConsumerSettings,
}

impl EventConsumer {
    pub fn new(
        queue: Arc<dyn NotificationQueue>,
        router: Arc<EventRouter>,
        settings: ConsumerSettings,
    ) -> Self {
        Self {
            queue,
            router,
            settings,
        }
    }

    /// Run the consumer on a background task
    pub fn spawn(self) -> EventConsumerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(self.run(shutdown_rx));
        EventConsumerHandle { shutdown_tx, join }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(
            bucket = %self.router.media_bucket(),
            max_messages = self.settings.max_messages,
            wait_time_seconds = self.settings.wait_time_seconds,
            "Event consumer started"
        );

        let mut consecutive_failures = 0u32;
        loop {
            let received = tokio::select! {
                _ = shutdown_rx.recv() => break,
                received = self
                    .queue
                    .receive(self.settings.max_messages, self.settings.wait_time_seconds) => received,
            };

            match received {
                Ok(messages) => {
                    consecutive_failures = 0;
                    if !messages.is_empty() {
                        self.process_messages(messages).await;
                    }
                }
                Err(e) => {
                    let backoff = compute_receive_backoff(consecutive_failures);
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    tracing::warn!(
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Queue receive failed, backing off"
                    );
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        tracing::info!("Event consumer stopped");
    }

    /// Receive one batch and process it. Used by the loop and by tests.
    pub async fn poll_once(&self) -> Result<BatchSummary, QueueError> {
        let messages = self
            .queue
            .receive(self.settings.max_messages, self.settings.wait_time_seconds)
            .await?;
        Ok(self.process_messages(messages).await)
    }

    /// Messages sharing an object key are handled one after another in receive order;
    /// unrelated messages run concurrently. Once a message fails, the rest of its lane
    /// is left on the queue as well.
    async fn process_messages(&self, messages: Vec<QueueMessage>) -> BatchSummary {
        let mut summary = BatchSummary {
            received: messages.len(),
            ..Default::default()
        };

        let parsed: Vec<_> = messages
            .iter()
            .map(|m| parse_notification_body(&m.body))
            .collect();
        let keys: Vec<Vec<&str>> = parsed
            .iter()
            .map(|p| match p {
                Ok(notifications) => notifications.iter().map(|n| n.key.as_str()).collect(),
                Err(_) => Vec::new(),
            })
            .collect();

        let lanes = partition_by_key(&keys);
        let (messages, parsed) = (&messages, &parsed);
        let lane_outcomes = join_all(lanes.iter().map(|lane| async move {
            let mut outcomes = Vec::with_capacity(lane.len());
            for &index in lane {
                // Later events for a key must not overtake one left for redelivery
                if outcomes.contains(&MessageOutcome::Failed) {
                    tracing::debug!(
                        message_id = %messages[index].message_id,
                        "Deferring message behind a failed message for the same key"
                    );
                    outcomes.push(MessageOutcome::Failed);
                    continue;
                }
                outcomes.push(self.process_message(&messages[index], &parsed[index]).await);
            }
            outcomes
        }))
        .await;

        for outcome in lane_outcomes.into_iter().flatten() {
            match outcome {
                MessageOutcome::Acknowledged => summary.acknowledged += 1,
                MessageOutcome::Failed => summary.failed += 1,
                MessageOutcome::Discarded => summary.discarded += 1,
            }
        }

        tracing::debug!(
            received = summary.received,
            lanes = lanes.len(),
            acknowledged = summary.acknowledged,
            failed = summary.failed,
            discarded = summary.discarded,
            "Batch processed"
        );
        summary
    }

    async fn process_message(
        &self,
        message: &QueueMessage,
        parsed: &Result<Vec<StorageNotification>, QueueError>,
    ) -> MessageOutcome {
        let notifications = match parsed {
            Ok(notifications) => notifications,
            Err(e) => {
                // Redelivery cannot fix a body we do not understand
                tracing::warn!(
                    message_id = %message.message_id,
                    error = %e,
                    "Failed to parse queue message, discarding"
                );
                return match self.queue.ack(message).await {
                    Ok(()) => MessageOutcome::Discarded,
                    Err(_) => MessageOutcome::Failed,
                };
            }
        };

        for notification in notifications {
            match self.router.route(notification).await {
                Ok(RouteOutcome::Ignored) => {}
                Ok(outcome) => {
                    tracing::debug!(
                        message_id = %message.message_id,
                        key = %notification.key,
                        outcome = ?outcome,
                        "Notification handled"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        message_id = %message.message_id,
                        bucket = %notification.bucket,
                        key = %notification.key,
                        error = %e,
                        "Notification processing failed, leaving message for redelivery"
                    );
                    return MessageOutcome::Failed;
                }
            }
        }

        match self.queue.ack(message).await {
            Ok(()) => MessageOutcome::Acknowledged,
            Err(_) => MessageOutcome::Failed,
        }
    }
}

/// Group message indices into lanes so that any two messages touching a common key
/// share a lane. Each lane lists its indices in ascending (receive) order.
pub(crate) fn partition_by_key(keys_per_message: &[Vec<&str>]) -> Vec<Vec<usize>> {
    let mut lanes: Vec<Vec<usize>> = Vec::new();
    let mut lane_of_key: HashMap<&str, usize> = HashMap::new();

    for (index, keys) in keys_per_message.iter().enumerate() {
        let mut touched: Vec<usize> = keys
            .iter()
            .filter_map(|key| lane_of_key.get(key).copied())
            .collect();
        touched.sort_unstable();
        touched.dedup();

        let target = match touched.first() {
            Some(&first) => first,
            None => {
                lanes.push(Vec::new());
                lanes.len() - 1
            }
        };

        // A message spanning several lanes joins them into one
        for &other in touched.iter().skip(1) {
            let moved = std::mem::take(&mut lanes[other]);
            lanes[target].extend(moved);
            for lane in lane_of_key.values_mut() {
                if *lane == other {
                    *lane = target;
                }
            }
        }
        lanes[target].sort_unstable();
        lanes[target].push(index);

        for &key in keys {
            lane_of_key.insert(key, target);
        }
    }

    lanes.retain(|lane| !lane.is_empty());
    lanes
}

/// Handle to a running [`EventConsumer`]
pub struct EventConsumerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl EventConsumerHandle {
    /// Signal the consumer to stop and wait for the current batch to finish
    pub async fn shutdown(self) {
        tracing::info!("Initiating event consumer shutdown");
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "Event consumer task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryNotificationQueue;
    use mediaquery_core::{Label, ListFilter, MediaKeyPolicy};
    use mediaquery_db::{CatalogStore, InMemoryCatalogStore};
    use mediaquery_vision::test_helpers::ScriptedLabelDetector;
    use mediaquery_vision::DetectionError;
    use serde_json::json;

    const BUCKET: &str = "media";

    fn s3_body(event_name: &str, keys: &[&str]) -> String {
        let records: Vec<_> = keys
            .iter()
            .map(|key| {
                json!({
                    "eventName": event_name,
                    "s3": { "bucket": { "name": BUCKET }, "object": { "key": key } }
                })
            })
            .collect();
        json!({ "Records": records }).to_string()
    }

    struct Harness {
        queue: Arc<InMemoryNotificationQueue>,
        detector: Arc<ScriptedLabelDetector>,
        catalog: Arc<InMemoryCatalogStore>,
        consumer: EventConsumer,
    }

    fn harness(detector: ScriptedLabelDetector) -> Harness {
        harness_with_wait(detector, 0)
    }

    fn harness_with_wait(detector: ScriptedLabelDetector, wait_time_seconds: i32) -> Harness {
        let queue = Arc::new(InMemoryNotificationQueue::new());
        let detector = Arc::new(detector);
        let catalog = Arc::new(InMemoryCatalogStore::new());
        let router = Arc::new(EventRouter::new(
            detector.clone(),
            catalog.clone(),
            MediaKeyPolicy::default(),
            BUCKET,
        ));
        let consumer = EventConsumer::new(
            queue.clone(),
            router,
            ConsumerSettings {
                max_messages: 10,
                wait_time_seconds,
            },
        );
        Harness {
            queue,
            detector,
            catalog,
            consumer,
        }
    }

    #[tokio::test]
    async fn test_created_messages_are_indexed_and_acked() {
        let h = harness(
            ScriptedLabelDetector::new()
                .with_labels(BUCKET, "photo.jpg", vec![Label::new("cat")])
                .with_labels(BUCKET, "other.png", vec![Label::new("dog")]),
        );
        h.queue.push(s3_body("ObjectCreated:Put", &["photo.jpg", "photo.gif"]));
        h.queue.push(s3_body("ObjectCreated:Put", &["other.png"]));

        let summary = h.consumer.poll_once().await.unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                received: 2,
                acknowledged: 2,
                failed: 0,
                discarded: 0
            }
        );
        assert_eq!(h.detector.call_count(), 2);
        let names: Vec<_> = h
            .catalog
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["other.png", "photo.jpg"]);
        assert_eq!(h.queue.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_failed_message_is_redelivered_then_succeeds() {
        let h = harness(
            ScriptedLabelDetector::new()
                .fail_next(DetectionError::Transient("throttled".into()))
                .with_labels(BUCKET, "beach.jpg", vec![Label::new("sand")]),
        );
        h.queue.push(s3_body("ObjectCreated:Put", &["beach.jpg"]));

        let first = h.consumer.poll_once().await.unwrap();
        assert_eq!(first.failed, 1);
        assert!(h.queue.acked().is_empty());
        assert!(h.catalog.is_empty());

        h.queue.redeliver_unacked();
        let second = h.consumer.poll_once().await.unwrap();
        assert_eq!(second.acknowledged, 1);

        let entries = h.catalog.list(&ListFilter::new().label("sand")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(h.queue.acked().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_message_is_discarded() {
        let h = harness(ScriptedLabelDetector::new());
        h.queue.push("definitely not an s3 event");

        let summary = h.consumer.poll_once().await.unwrap();

        assert_eq!(summary.discarded, 1);
        assert_eq!(h.queue.acked().len(), 1);
        assert_eq!(h.detector.call_count(), 0);
    }

    #[tokio::test]
    async fn test_removed_message_deletes_entry() {
        let h = harness(ScriptedLabelDetector::new());
        h.catalog
            .upsert("old.jpg", mediaquery_core::MediaType::Image, &[])
            .await
            .unwrap();
        h.queue.push(s3_body("ObjectRemoved:Delete", &["old.jpg"]));

        let summary = h.consumer.poll_once().await.unwrap();

        assert_eq!(summary.acknowledged, 1);
        assert!(h.catalog.get("old.jpg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_spawned_consumer_processes_and_shuts_down() {
        // Long polling keeps the loop from spinning while the queue is empty
        let h = harness_with_wait(
            ScriptedLabelDetector::new().with_labels(BUCKET, "a.jpg", vec![Label::new("cat")]),
            1,
        );
        let Harness {
            queue,
            catalog,
            consumer,
            ..
        } = h;
        queue.fail_receives(1);
        queue.push(s3_body("ObjectCreated:Put", &["a.jpg"]));

        let handle = consumer.spawn();

        let mut indexed = false;
        for _ in 0..500 {
            if catalog.get("a.jpg").await.unwrap().is_some() {
                indexed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.shutdown().await;

        assert!(indexed);
        assert_eq!(queue.visible_len(), 0);
    }

    #[tokio::test]
    async fn test_create_then_remove_in_one_batch_leaves_no_entry() {
        let h = harness(
            ScriptedLabelDetector::new()
                .with_labels(BUCKET, "a.jpg", vec![Label::new("cat")])
                .with_delay(Duration::from_millis(50)),
        );
        h.queue.push(s3_body("ObjectCreated:Put", &["a.jpg"]));
        h.queue.push(s3_body("ObjectRemoved:Delete", &["a.jpg"]));

        let summary = h.consumer.poll_once().await.unwrap();

        assert_eq!(summary.acknowledged, 2);
        assert!(h.catalog.get("a.jpg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_defers_later_messages_for_same_key() {
        let h = harness(
            ScriptedLabelDetector::new()
                .fail_next(DetectionError::Transient("throttled".into()))
                .with_labels(BUCKET, "b.png", vec![Label::new("dog")]),
        );
        h.catalog
            .upsert("c.jpg", mediaquery_core::MediaType::Image, &[])
            .await
            .unwrap();
        h.queue.push(s3_body("ObjectCreated:Put", &["b.png"]));
        h.queue.push(s3_body("ObjectRemoved:Delete", &["b.png"]));
        h.queue.push(s3_body("ObjectRemoved:Delete", &["c.jpg"]));

        let summary = h.consumer.poll_once().await.unwrap();

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.acknowledged, 1);
        assert_eq!(h.detector.call_count(), 1);
        assert_eq!(h.queue.in_flight_len(), 2);
        assert!(h.catalog.get("c.jpg").await.unwrap().is_none());
    }

    #[test]
    fn test_partition_keeps_same_key_messages_in_order() {
        let keys = vec![
            vec!["a.jpg"],
            vec!["b.jpg"],
            vec!["a.jpg"],
            vec![],
            vec!["c.jpg", "b.jpg"],
        ];
        assert_eq!(
            partition_by_key(&keys),
            vec![vec![0, 2], vec![1, 4], vec![3]]
        );
    }

    #[test]
    fn test_partition_merges_lanes_joined_by_one_message() {
        let keys = vec![vec!["a.jpg"], vec!["b.jpg"], vec!["a.jpg", "b.jpg"], vec!["b.jpg"]];
        assert_eq!(partition_by_key(&keys), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_receive_backoff_exponential_then_capped() {
        assert_eq!(compute_receive_backoff(0), Duration::from_secs(1));
        assert_eq!(compute_receive_backoff(1), Duration::from_secs(2));
        assert_eq!(compute_receive_backoff(4), Duration::from_secs(16));
        assert_eq!(compute_receive_backoff(5), MAX_RECEIVE_BACKOFF);
        assert_eq!(compute_receive_backoff(u32::MAX), MAX_RECEIVE_BACKOFF);
    }

    #[test]
    fn test_settings_from_queue_settings() {
        let settings = ConsumerSettings::from(&QueueSettings::default());
        assert_eq!(settings.max_messages, 10);
        assert_eq!(settings.wait_time_seconds, 20);
    }
}
