//! In-process queue for tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

use crate::error::QueueError;
use crate::queue::{NotificationQueue, QueueMessage};

#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<(String, String)>,
    in_flight: HashMap<String, (String, String)>,
    acked: Vec<String>,
    receive_failures: usize,
}

/// Queue with explicit visibility: received messages stay in flight until acked or
/// until [`InMemoryNotificationQueue::redeliver_unacked`] makes them visible again.
#[derive(Debug, Default)]
pub struct InMemoryNotificationQueue {
    state: Mutex<QueueState>,
    next_id: AtomicUsize,
    pushed: Notify,
}

impl InMemoryNotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a body; returns its message id
    pub fn push(&self, body: impl Into<String>) -> String {
        let id = format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut state) = self.state.lock() {
            state.visible.push_back((id.clone(), body.into()));
        }
        self.pushed.notify_waiters();
        id
    }

    /// Make the next `count` receive calls fail
    pub fn fail_receives(&self, count: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.receive_failures = count;
        }
    }

    /// Simulate the visibility timeout expiring for every unacknowledged message
    pub fn redeliver_unacked(&self) {
        if let Ok(mut state) = self.state.lock() {
            let mut in_flight: Vec<_> = state.in_flight.drain().map(|(_, m)| m).collect();
            in_flight.sort();
            state.visible.extend(in_flight);
        }
        self.pushed.notify_waiters();
    }

    pub fn visible_len(&self) -> usize {
        self.state.lock().map(|s| s.visible.len()).unwrap_or(0)
    }

    pub fn in_flight_len(&self) -> usize {
        self.state.lock().map(|s| s.in_flight.len()).unwrap_or(0)
    }

    /// Ids of acknowledged messages, in ack order
    pub fn acked(&self) -> Vec<String> {
        self.state.lock().map(|s| s.acked.clone()).unwrap_or_default()
    }

    fn take_visible(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| QueueError::Receive("queue lock poisoned".to_string()))?;

        if state.receive_failures > 0 {
            state.receive_failures -= 1;
            return Err(QueueError::Receive("injected receive failure".to_string()));
        }

        let mut messages = Vec::new();
        while messages.len() < max_messages {
            let Some((id, body)) = state.visible.pop_front() else {
                break;
            };
            let receipt_handle = format!("{}-receipt-{}", id, self.next_id.fetch_add(1, Ordering::SeqCst));
            state
                .in_flight
                .insert(receipt_handle.clone(), (id.clone(), body.clone()));
            messages.push(QueueMessage {
                message_id: id,
                receipt_handle,
                body,
            });
        }
        Ok(messages)
    }
}

#[async_trait]
impl NotificationQueue for InMemoryNotificationQueue {
    async fn receive(
        &self,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let max_messages = max_messages.clamp(1, 10) as usize;
        let notified = self.pushed.notified();

        let messages = self.take_visible(max_messages)?;
        if !messages.is_empty() || wait_time_seconds <= 0 {
            return Ok(messages);
        }

        // Long poll: wait for a push, then try once more
        let wait = Duration::from_secs(wait_time_seconds as u64);
        let _ = tokio::time::timeout(wait, notified).await;
        self.take_visible(max_messages)
    }

    async fn ack(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| QueueError::Ack("queue lock poisoned".to_string()))?;
        match state.in_flight.remove(&message.receipt_handle) {
            Some((id, _)) => {
                state.acked.push(id);
                Ok(())
            }
            None => Err(QueueError::Ack(format!(
                "unknown receipt handle {}",
                message.receipt_handle
            ))),
        }
    }
}
