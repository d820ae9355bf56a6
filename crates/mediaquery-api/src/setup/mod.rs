//! Application setup and initialization
//!
//! Clients are built once here and shared by reference: the catalog store is used by
//! both the HTTP router and the event router, the label detector only by ingest.

pub mod aws;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use mediaquery_core::Config;
use mediaquery_infra::{LogFormat, TelemetryConfig};
use mediaquery_worker::EventConsumer;

/// Everything `main` needs to run the service
pub struct App {
    pub state: AppState,
    pub router: axum::Router,
    /// Present when a notification queue is configured
    pub consumer: Option<EventConsumer>,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<App> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    let format: LogFormat = config
        .log_format()
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    mediaquery_infra::init_telemetry(&TelemetryConfig {
        service_name: env!("CARGO_PKG_NAME").to_string(),
        service_version: env!("CARGO_PKG_VERSION").to_string(),
        environment: config.environment.clone(),
        format,
    })
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        bucket = %config.media_bucket_name,
        backend = ?config.catalog_backend,
        "Configuration loaded and validated successfully"
    );

    let sdk_config = aws::load_sdk_config(&config).await;

    let catalog = services::setup_catalog(&config, &sdk_config).await?;
    let consumer = services::setup_consumer(&config, &sdk_config, catalog.clone());

    let state = AppState::new(catalog, config.clone());
    let router = routes::setup_routes(&config, state.clone())?;

    Ok(App {
        state,
        router,
        consumer,
    })
}
