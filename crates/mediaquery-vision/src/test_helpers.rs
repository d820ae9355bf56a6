//! In-process label detectors for tests

use async_trait::async_trait;
use mediaquery_core::Label;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::detector::LabelDetector;
use crate::error::DetectionError;

/// Returns canned labels per object and records every call.
///
/// Queued failures are returned first, one per call, before any labels. Objects
/// without canned labels yield an empty list.
#[derive(Debug, Default)]
pub struct ScriptedLabelDetector {
    labels: HashMap<(String, String), Vec<Label>>,
    failures: Mutex<VecDeque<DetectionError>>,
    calls: Mutex<Vec<(String, String)>>,
    delay: Option<Duration>,
}

impl ScriptedLabelDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels(mut self, bucket: &str, key: &str, labels: Vec<Label>) -> Self {
        self.labels
            .insert((bucket.to_string(), key.to_string()), labels);
        self
    }

    pub fn fail_next(self, err: DetectionError) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(err);
        }
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// `(bucket, key)` of every call, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LabelDetector for ScriptedLabelDetector {
    async fn detect(&self, bucket: &str, key: &str) -> Result<Vec<Label>, DetectionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((bucket.to_string(), key.to_string()));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failures
            .lock()
            .ok()
            .and_then(|mut failures| failures.pop_front());
        if let Some(err) = failure {
            return Err(err);
        }

        Ok(self
            .labels
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
