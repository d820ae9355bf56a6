//! S3 event notification decoding
//!
//! Accepts the three shapes a queue subscribed to bucket notifications receives:
//! a bare S3 event (`{"Records": [...]}`), the same event wrapped in an SNS envelope
//! (`{"Type": "Notification", "Message": "<json>"}`), and the `s3:TestEvent` sent when
//! the subscription is created. Object keys arrive form-urlencoded.

use serde::Deserialize;

use crate::error::QueueError;

const TEST_EVENT: &str = "s3:TestEvent";
const CREATED_PREFIX: &str = "ObjectCreated:";
const REMOVED_PREFIX: &str = "ObjectRemoved:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEventKind {
    Created,
    Removed,
}

/// One object-level event from the storage system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNotification {
    pub bucket: String,
    /// Decoded object key
    pub key: String,
    pub kind: StorageEventKind,
}

impl StorageNotification {
    pub fn created(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            kind: StorageEventKind::Created,
        }
    }

    pub fn removed(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            kind: StorageEventKind::Removed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct S3Event {
    #[serde(rename = "Records", default)]
    records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S3EventRecord {
    event_name: String,
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// Decode a queue message body into zero or more notifications.
///
/// Test events and records for event types other than created/removed yield no
/// notifications. Bodies that are not JSON, or JSON of an unknown shape, are
/// [`QueueError::Malformed`].
pub fn parse_notification_body(body: &str) -> Result<Vec<StorageNotification>, QueueError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    parse_notification_value(value, true)
}

fn parse_notification_value(
    value: serde_json::Value,
    allow_envelope: bool,
) -> Result<Vec<StorageNotification>, QueueError> {
    if value.get("Event").and_then(|v| v.as_str()) == Some(TEST_EVENT) {
        return Ok(Vec::new());
    }

    if value.get("Records").is_some() {
        let event: S3Event = serde_json::from_value(value)?;
        return Ok(event
            .records
            .into_iter()
            .filter_map(record_to_notification)
            .collect());
    }

    if allow_envelope && value.get("Type").and_then(|v| v.as_str()) == Some("Notification") {
        let message = value
            .get("Message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| QueueError::Malformed("SNS envelope without Message".to_string()))?;
        let inner: serde_json::Value = serde_json::from_str(message)?;
        return parse_notification_value(inner, false);
    }

    Err(QueueError::Malformed(
        "expected an S3 event notification".to_string(),
    ))
}

/// A record whose key cannot be decoded is skipped so the other records in the same
/// message are still delivered.
fn record_to_notification(record: S3EventRecord) -> Option<StorageNotification> {
    let kind = if record.event_name.starts_with(CREATED_PREFIX) {
        StorageEventKind::Created
    } else if record.event_name.starts_with(REMOVED_PREFIX) {
        StorageEventKind::Removed
    } else {
        tracing::debug!(event_name = %record.event_name, "Skipping unhandled S3 event type");
        return None;
    };

    let key = match decode_object_key(&record.s3.object.key) {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!(
                bucket = %record.s3.bucket.name,
                raw_key = %record.s3.object.key,
                error = %e,
                "Skipping record with undecodable object key"
            );
            return None;
        }
    };

    Some(StorageNotification {
        bucket: record.s3.bucket.name,
        key,
        kind,
    })
}

/// S3 form-encodes keys in notifications: spaces become `+` and everything else
/// outside the unreserved set is percent-encoded.
pub fn decode_object_key(raw: &str) -> Result<String, QueueError> {
    let plus_decoded = raw.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(|key| key.into_owned())
        .map_err(|e| QueueError::Malformed(format!("object key '{}' is not valid UTF-8: {}", raw, e)))
}
