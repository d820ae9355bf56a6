//! Configuration module
//!
//! Process configuration is read once at startup from the environment (optionally
//! seeded from a `.env` file) and passed explicitly to every component.

use std::env;
use std::time::Duration;

use crate::media_key::MediaKeyPolicy;

// Common constants
const SERVER_PORT: u16 = 8000;
const DB_MAX_CONNECTIONS: u32 = 10;
const DB_TIMEOUT_SECS: u64 = 30;
const SQS_WAIT_TIME_SECS: i32 = 20;
const SQS_MAX_MESSAGES: i32 = 10;
const LABEL_DETECTION_TIMEOUT_SECS: u64 = 10;
const LABEL_DETECTION_MAX_RETRIES: u32 = 2;
const HTTP_CONCURRENCY_LIMIT: usize = 1024;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backend holding the media catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    DynamoDb,
    Postgres,
    Memory,
}

impl CatalogBackend {
    fn parse(value: &str) -> Result<Self, anyhow::Error> {
        match value.to_lowercase().as_str() {
            "dynamodb" | "dynamo" => Ok(CatalogBackend::DynamoDb),
            "postgres" | "postgresql" => Ok(CatalogBackend::Postgres),
            "memory" | "in-memory" => Ok(CatalogBackend::Memory),
            other => Err(anyhow::anyhow!(
                "CATALOG_BACKEND must be one of dynamodb, postgres, memory (got '{}')",
                other
            )),
        }
    }
}

/// Settings forwarded to the label detection client
#[derive(Clone, Debug, PartialEq)]
pub struct LabelDetectionSettings {
    pub min_confidence: Option<f32>,
    pub max_labels: Option<i32>,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for LabelDetectionSettings {
    fn default() -> Self {
        Self {
            min_confidence: None,
            max_labels: None,
            timeout: Duration::from_secs(LABEL_DETECTION_TIMEOUT_SECS),
            max_retries: LABEL_DETECTION_MAX_RETRIES,
        }
    }
}

/// Storage notification queue settings. The consumer is disabled without a queue URL.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueSettings {
    pub queue_url: Option<String>,
    pub wait_time_seconds: i32,
    pub max_messages: i32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            queue_url: None,
            wait_time_seconds: SQS_WAIT_TIME_SECS,
            max_messages: SQS_MAX_MESSAGES,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub log_format: Option<String>,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub http_request_timeout: Duration,
    /// Bucket whose notifications are processed
    pub media_bucket_name: String,
    /// Catalog table (DynamoDB table or Postgres table name)
    pub media_table_name: Option<String>,
    pub catalog_backend: CatalogBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub aws_region: Option<String>,
    pub dynamodb_endpoint: Option<String>,
    pub media_key_policy: MediaKeyPolicy,
    pub label_detection: LabelDetectionSettings,
    pub queue: QueueSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let media_bucket_name = lookup("MEDIA_BUCKET_NAME")
            .ok_or_else(|| anyhow::anyhow!("MEDIA_BUCKET_NAME must be set"))?;

        let catalog_backend = match lookup("CATALOG_BACKEND") {
            Some(value) => CatalogBackend::parse(&value)?,
            None => CatalogBackend::DynamoDb,
        };

        let media_key_policy = lookup("SUPPORTED_MEDIA_EXTENSIONS")
            .map(|csv| MediaKeyPolicy::from_csv(&csv))
            .unwrap_or_default();

        let label_detection = LabelDetectionSettings {
            min_confidence: lookup("LABEL_MIN_CONFIDENCE").and_then(|s| s.parse().ok()),
            max_labels: lookup("LABEL_MAX_LABELS").and_then(|s| s.parse().ok()),
            timeout: Duration::from_secs(
                lookup("LABEL_DETECTION_TIMEOUT_SECONDS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(LABEL_DETECTION_TIMEOUT_SECS),
            ),
            max_retries: lookup("LABEL_DETECTION_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(LABEL_DETECTION_MAX_RETRIES),
        };

        let queue = QueueSettings {
            queue_url: lookup("MEDIA_EVENTS_QUEUE_URL").filter(|s| !s.trim().is_empty()),
            wait_time_seconds: lookup("SQS_WAIT_TIME_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SQS_WAIT_TIME_SECS),
            // SQS accepts 1..=10 messages per receive
            max_messages: lookup("SQS_MAX_MESSAGES")
                .and_then(|s| s.parse::<i32>().ok())
                .unwrap_or(SQS_MAX_MESSAGES)
                .clamp(1, 10),
        };

        Ok(Config {
            server_port,
            environment,
            log_format: lookup("LOG_FORMAT").map(|s| s.to_lowercase()),
            cors_origins,
            http_concurrency_limit: lookup("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            http_request_timeout: Duration::from_secs(
                lookup("HTTP_REQUEST_TIMEOUT_SECONDS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(HTTP_REQUEST_TIMEOUT_SECS),
            ),
            media_bucket_name,
            media_table_name: lookup("MEDIA_TABLE_NAME"),
            catalog_backend,
            database_url: lookup("DATABASE_URL"),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DB_MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DB_TIMEOUT_SECS),
            aws_region: lookup("AWS_REGION"),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT"),
            media_key_policy,
            label_detection,
            queue,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Log output format: `json` or `pretty`. Production defaults to JSON.
    pub fn log_format(&self) -> &str {
        match self.log_format.as_deref() {
            Some(format) => format,
            None if self.is_production() => "json",
            None => "pretty",
        }
    }

    /// Fail fast on combinations that cannot work at runtime
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.media_bucket_name.trim().is_empty() {
            return Err(anyhow::anyhow!("MEDIA_BUCKET_NAME cannot be empty"));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        match self.catalog_backend {
            CatalogBackend::DynamoDb if self.media_table_name.is_none() => {
                return Err(anyhow::anyhow!(
                    "MEDIA_TABLE_NAME must be set for the dynamodb catalog backend"
                ));
            }
            CatalogBackend::Postgres if self.database_url.is_none() => {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be set for the postgres catalog backend"
                ));
            }
            _ => {}
        }

        if self.media_key_policy.extensions().is_empty() {
            return Err(anyhow::anyhow!(
                "SUPPORTED_MEDIA_EXTENSIONS must list at least one suffix"
            ));
        }

        if let Some(confidence) = self.label_detection.min_confidence {
            if !(0.0..=100.0).contains(&confidence) {
                return Err(anyhow::anyhow!(
                    "LABEL_MIN_CONFIDENCE must be between 0 and 100"
                ));
            }
        }

        if !(0..=20).contains(&self.queue.wait_time_seconds) {
            return Err(anyhow::anyhow!(
                "SQS_WAIT_TIME_SECONDS must be between 0 and 20"
            ));
        }

        Ok(())
    }
}
