//! Client construction

use anyhow::{Context, Result};
use mediaquery_core::Config;
use mediaquery_db::{create_catalog_store, CatalogStore};
use mediaquery_vision::{LabelDetector, RekognitionLabelDetector, RetryPolicy, RetryingDetector};
use mediaquery_worker::{ConsumerSettings, EventConsumer, EventRouter, SqsNotificationQueue};
use std::sync::Arc;

/// Create the catalog store and probe it once
pub async fn setup_catalog(
    config: &Config,
    sdk_config: &aws_config::SdkConfig,
) -> Result<Arc<dyn CatalogStore>> {
    let catalog = create_catalog_store(config, sdk_config)
        .await
        .context("Failed to create catalog store")?;

    // An unreachable store at startup is logged, not fatal; requests will report it
    if let Err(e) = catalog.health_check().await {
        tracing::warn!(
            backend = catalog.backend_name(),
            error = %e,
            "Catalog store health check failed"
        );
    }

    Ok(catalog)
}

/// Rekognition wrapped with the configured timeout and retry policy
pub fn setup_label_detector(
    config: &Config,
    sdk_config: &aws_config::SdkConfig,
) -> Arc<dyn LabelDetector> {
    let settings = &config.label_detection;
    let detector = RetryingDetector::new(
        RekognitionLabelDetector::from_sdk_config(sdk_config, settings),
        RetryPolicy::from(settings),
    );
    tracing::info!(
        timeout_ms = settings.timeout.as_millis() as u64,
        max_retries = settings.max_retries,
        min_confidence = ?settings.min_confidence,
        max_labels = ?settings.max_labels,
        "Label detector initialized"
    );
    Arc::new(detector)
}

/// Build the ingest consumer when a queue URL is configured
pub fn setup_consumer(
    config: &Config,
    sdk_config: &aws_config::SdkConfig,
    catalog: Arc<dyn CatalogStore>,
) -> Option<EventConsumer> {
    let Some(queue_url) = config.queue.queue_url.as_deref() else {
        tracing::info!("MEDIA_EVENTS_QUEUE_URL not set, ingest consumer disabled");
        return None;
    };

    let router = Arc::new(EventRouter::new(
        setup_label_detector(config, sdk_config),
        catalog,
        config.media_key_policy.clone(),
        config.media_bucket_name.clone(),
    ));
    let queue = Arc::new(SqsNotificationQueue::from_sdk_config(sdk_config, queue_url));

    tracing::info!(
        queue_url = %queue_url,
        extensions = %config.media_key_policy.extensions().join(","),
        "Ingest consumer configured"
    );
    Some(EventConsumer::new(
        queue,
        router,
        ConsumerSettings::from(&config.queue),
    ))
}
