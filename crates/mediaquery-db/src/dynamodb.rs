//! DynamoDB catalog backend
//!
//! ## Table Schema
//! ```text
//! Partition Key: name (S) - object storage key
//! Attributes:
//!   - media_type: S ("image" | "video")
//!   - labels: L of M { name: S, confidence: N (optional) }
//! ```
//!
//! The table is provisioned externally with `name` as its only key. Point operations map
//! to `GetItem` / `PutItem` / `DeleteItem`. Listing is a paginated `Scan`; the prefix and
//! media type predicates are sent as a filter expression to cut transfer, and the full
//! [`ListFilter`] is re-applied to every returned item.

use async_trait::async_trait;
use aws_sdk_dynamodb::config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use mediaquery_core::{AppError, Label, ListFilter, MediaEntry, MediaType};
use std::collections::HashMap;
use std::time::Duration;

use crate::catalog::CatalogStore;

const ATTR_NAME: &str = "name";
const ATTR_MEDIA_TYPE: &str = "media_type";
const ATTR_LABELS: &str = "labels";
const ATTR_CONFIDENCE: &str = "confidence";

#[derive(Clone)]
pub struct DynamoCatalogStore {
    client: DynamoDbClient,
    table_name: String,
    scan_page_size: Option<i32>,
}

impl DynamoCatalogStore {
    pub fn new(client: DynamoDbClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            scan_page_size: None,
        }
    }

    /// Cap the items evaluated per `Scan` page; unset uses the service's 1 MB pages
    pub fn with_scan_page_size(mut self, page_size: i32) -> Self {
        self.scan_page_size = Some(page_size.max(1));
        self
    }

    /// Build a client from shared AWS configuration, optionally pointed at a custom
    /// endpoint (DynamoDB Local). Every operation, retries included, is bounded by
    /// `operation_timeout`.
    pub fn from_sdk_config(
        sdk_config: &aws_config::SdkConfig,
        table_name: impl Into<String>,
        endpoint_url: Option<&str>,
        operation_timeout: Duration,
    ) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config).timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(operation_timeout)
                .build(),
        );
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        Self::new(DynamoDbClient::from_conf(builder.build()), table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl CatalogStore for DynamoCatalogStore {
    #[tracing::instrument(skip(self, labels), fields(table_name = %self.table_name))]
    async fn upsert(
        &self,
        name: &str,
        media_type: MediaType,
        labels: &[Label],
    ) -> Result<(), AppError> {
        let start = std::time::Instant::now();

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(entry_to_item(name, media_type, labels)))
            .send()
            .await
            .map_err(|e| {
                let message = format!("DynamoDB put_item failed: {}", DisplayErrorContext(&e));
                tracing::error!(name = %name, error = %message, "Catalog upsert failed");
                AppError::StoreUnavailable(message)
            })?;

        tracing::debug!(
            name = %name,
            label_count = labels.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Catalog entry upserted"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(table_name = %self.table_name))]
    async fn get(&self, name: &str) -> Result<Option<MediaEntry>, AppError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ATTR_NAME, AttributeValue::S(name.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                let message = format!("DynamoDB get_item failed: {}", DisplayErrorContext(&e));
                tracing::error!(name = %name, error = %message, "Catalog lookup failed");
                AppError::StoreUnavailable(message)
            })?;

        result.item().map(item_to_entry).transpose()
    }

    #[tracing::instrument(skip(self), fields(table_name = %self.table_name))]
    async fn delete(&self, name: &str) -> Result<(), AppError> {
        // DeleteItem on a missing key succeeds, which is the contract we want
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(ATTR_NAME, AttributeValue::S(name.to_string()))
            .send()
            .await
            .map_err(|e| {
                let message = format!("DynamoDB delete_item failed: {}", DisplayErrorContext(&e));
                tracing::error!(name = %name, error = %message, "Catalog delete failed");
                AppError::StoreUnavailable(message)
            })?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(table_name = %self.table_name))]
    async fn list(&self, filter: &ListFilter) -> Result<Vec<MediaEntry>, AppError> {
        let start = std::time::Instant::now();
        let scan_filter = ScanFilter::from_list_filter(filter);

        let mut entries = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0u32;

        loop {
            let mut request = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_limit(self.scan_page_size)
                .set_exclusive_start_key(exclusive_start_key.take());

            if let Some(scan_filter) = &scan_filter {
                request = request
                    .filter_expression(&scan_filter.expression)
                    .set_expression_attribute_names(Some(scan_filter.names.clone()))
                    .set_expression_attribute_values(Some(scan_filter.values.clone()));
            }

            let page = request.send().await.map_err(|e| {
                let message = format!("DynamoDB scan failed: {}", DisplayErrorContext(&e));
                tracing::error!(error = %message, pages, "Catalog scan failed");
                AppError::StoreUnavailable(message)
            })?;
            pages += 1;

            for item in page.items() {
                let entry = item_to_entry(item)?;
                if filter.matches(&entry) {
                    entries.push(entry);
                }
            }

            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
                _ => break,
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            pages,
            result_count = entries.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Catalog scan completed"
        );
        Ok(entries)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!(
                    "DynamoDB describe_table failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "dynamodb"
    }
}

/// Server-side part of a listing filter
#[derive(Debug, PartialEq)]
struct ScanFilter {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ScanFilter {
    /// Translate the predicates DynamoDB can evaluate directly. Returns `None` when
    /// nothing can be pushed down.
    fn from_list_filter(filter: &ListFilter) -> Option<Self> {
        let mut clauses = Vec::new();
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        if let Some(prefix) = &filter.startswith {
            // begins_with rejects an empty operand; an empty prefix matches everything
            if !prefix.is_empty() {
                clauses.push("begins_with(#name, :prefix)".to_string());
                names.insert("#name".to_string(), ATTR_NAME.to_string());
                values.insert(":prefix".to_string(), AttributeValue::S(prefix.clone()));
            }
        }
        if let Some(media_type) = filter.media_type {
            clauses.push("#media_type = :media_type".to_string());
            names.insert("#media_type".to_string(), ATTR_MEDIA_TYPE.to_string());
            values.insert(
                ":media_type".to_string(),
                AttributeValue::S(media_type.as_str().to_string()),
            );
        }

        if clauses.is_empty() {
            return None;
        }

        Some(Self {
            expression: clauses.join(" AND "),
            names,
            values,
        })
    }
}

fn entry_to_item(
    name: &str,
    media_type: MediaType,
    labels: &[Label],
) -> HashMap<String, AttributeValue> {
    let labels = labels
        .iter()
        .map(|label| {
            let mut map = HashMap::new();
            map.insert(ATTR_NAME.to_string(), AttributeValue::S(label.name.clone()));
            if let Some(confidence) = label.confidence {
                map.insert(
                    ATTR_CONFIDENCE.to_string(),
                    AttributeValue::N(confidence.to_string()),
                );
            }
            AttributeValue::M(map)
        })
        .collect();

    let mut item = HashMap::new();
    item.insert(ATTR_NAME.to_string(), AttributeValue::S(name.to_string()));
    item.insert(
        ATTR_MEDIA_TYPE.to_string(),
        AttributeValue::S(media_type.as_str().to_string()),
    );
    item.insert(ATTR_LABELS.to_string(), AttributeValue::L(labels));
    item
}

fn item_to_entry(item: &HashMap<String, AttributeValue>) -> Result<MediaEntry, AppError> {
    let name = item
        .get(ATTR_NAME)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| AppError::Internal("Catalog item is missing 'name'".to_string()))?;

    let media_type = item
        .get(ATTR_MEDIA_TYPE)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| {
            AppError::Internal(format!("Catalog item {} is missing 'media_type'", name))
        })?
        .parse::<MediaType>()
        .map_err(|e| AppError::Internal(format!("Catalog item {}: {}", name, e)))?;

    let labels = match item.get(ATTR_LABELS) {
        None => Vec::new(),
        Some(AttributeValue::L(values)) => values
            .iter()
            .map(attribute_to_label)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                AppError::Internal(format!("Catalog item {} has malformed labels", name))
            })?,
        Some(_) => {
            return Err(AppError::Internal(format!(
                "Catalog item {} has malformed labels",
                name
            )))
        }
    };

    Ok(MediaEntry::new(name.clone(), media_type, labels))
}

/// Labels are maps; bare strings are accepted too so items written as plain name
/// lists still load.
fn attribute_to_label(value: &AttributeValue) -> Option<Label> {
    match value {
        AttributeValue::S(name) => Some(Label::new(name.clone())),
        AttributeValue::M(map) => {
            let name = map.get(ATTR_NAME)?.as_s().ok()?.clone();
            let confidence = map
                .get(ATTR_CONFIDENCE)
                .and_then(|v| v.as_n().ok())
                .and_then(|n| n.parse::<f32>().ok());
            Some(Label { name, confidence })
        }
        _ => None,
    }
}
