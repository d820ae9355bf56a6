//! Catalog store factory
//!
//! Builds the backend selected by `CATALOG_BACKEND` once at startup. The returned
//! handle is shared by the HTTP router and the notification consumer.

use mediaquery_core::{AppError, CatalogBackend, Config};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::CatalogStore;
use crate::dynamodb::DynamoCatalogStore;
use crate::memory::InMemoryCatalogStore;
use crate::postgres::PostgresCatalogStore;

/// Default table name for the postgres backend when `MEDIA_TABLE_NAME` is unset
const DEFAULT_POSTGRES_TABLE: &str = "media_catalog";

/// Create the configured catalog store
pub async fn create_catalog_store(
    config: &Config,
    sdk_config: &aws_config::SdkConfig,
) -> Result<Arc<dyn CatalogStore>, AppError> {
    let store: Arc<dyn CatalogStore> = match config.catalog_backend {
        CatalogBackend::DynamoDb => {
            let table_name = config.media_table_name.as_deref().ok_or_else(|| {
                AppError::InvalidInput(
                    "MEDIA_TABLE_NAME is required for the dynamodb catalog backend".to_string(),
                )
            })?;
            Arc::new(DynamoCatalogStore::from_sdk_config(
                sdk_config,
                table_name,
                config.dynamodb_endpoint.as_deref(),
                Duration::from_secs(config.db_timeout_seconds),
            ))
        }
        CatalogBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                AppError::InvalidInput(
                    "DATABASE_URL is required for the postgres catalog backend".to_string(),
                )
            })?;

            tracing::info!(
                max_connections = config.db_max_connections,
                "Connecting to catalog database"
            );
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
                .connect(database_url)
                .await
                .map_err(|e| {
                    AppError::StoreUnavailable(format!("Failed to connect to database: {}", e))
                })?;

            let table_name = config
                .media_table_name
                .as_deref()
                .unwrap_or(DEFAULT_POSTGRES_TABLE);
            let store = PostgresCatalogStore::new(pool, table_name)?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
        CatalogBackend::Memory => {
            tracing::warn!("Using in-memory catalog; entries are lost on restart");
            Arc::new(InMemoryCatalogStore::new())
        }
    };

    tracing::info!(backend = store.backend_name(), "Catalog store initialized");
    Ok(store)
}
