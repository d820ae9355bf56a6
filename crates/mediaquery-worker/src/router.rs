//! Storage event routing
//!
//! Stateless: each notification is handled on its own, with no deduplication or
//! ordering across notifications. Catalog writes are idempotent, so redelivery is safe.

use mediaquery_core::{AppError, MediaKeyPolicy, MediaType};
use mediaquery_db::CatalogStore;
use mediaquery_vision::LabelDetector;
use std::sync::Arc;

use crate::notification::{StorageEventKind, StorageNotification};

/// What the router did with a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Labels detected and the entry written
    Indexed { label_count: usize },
    /// Entry removed (or already absent)
    Removed,
    /// Unsupported key or foreign bucket; nothing was called
    Ignored,
}

pub struct EventRouter {
    detector: Arc<dyn LabelDetector>,
    catalog: Arc<dyn CatalogStore>,
    policy: MediaKeyPolicy,
    media_bucket: String,
}

impl EventRouter {
    pub fn new(
        detector: Arc<dyn LabelDetector>,
        catalog: Arc<dyn CatalogStore>,
        policy: MediaKeyPolicy,
        media_bucket: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            catalog,
            policy,
            media_bucket: media_bucket.into(),
        }
    }

    pub fn media_bucket(&self) -> &str {
        &self.media_bucket
    }

    pub async fn route(&self, notification: &StorageNotification) -> Result<RouteOutcome, AppError> {
        if notification.bucket != self.media_bucket {
            tracing::debug!(
                bucket = %notification.bucket,
                key = %notification.key,
                "Ignoring notification for another bucket"
            );
            return Ok(RouteOutcome::Ignored);
        }

        match notification.kind {
            StorageEventKind::Created => {
                self.handle_object_created(&notification.bucket, &notification.key)
                    .await
            }
            StorageEventKind::Removed => self.handle_object_removed(&notification.key).await,
        }
    }

    /// Detect labels for a new image and record it in the catalog
    #[tracing::instrument(skip(self))]
    pub async fn handle_object_created(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<RouteOutcome, AppError> {
        if !self.policy.is_supported_media_key(key) {
            tracing::debug!("Ignoring unsupported object type");
            return Ok(RouteOutcome::Ignored);
        }

        let start = std::time::Instant::now();
        let labels = self.detector.detect(bucket, key).await?;
        self.catalog.upsert(key, MediaType::Image, &labels).await?;

        tracing::info!(
            label_count = labels.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Media indexed"
        );
        Ok(RouteOutcome::Indexed {
            label_count: labels.len(),
        })
    }

    /// Drop the catalog entry for a deleted image
    #[tracing::instrument(skip(self))]
    pub async fn handle_object_removed(&self, key: &str) -> Result<RouteOutcome, AppError> {
        if !self.policy.is_supported_media_key(key) {
            tracing::debug!("Ignoring unsupported object type");
            return Ok(RouteOutcome::Ignored);
        }

        self.catalog.delete(key).await?;

        tracing::info!("Media removed from catalog");
        Ok(RouteOutcome::Removed)
    }
}
