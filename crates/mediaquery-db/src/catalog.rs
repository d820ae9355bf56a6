//! Catalog store abstraction
//!
//! This module defines the trait all catalog backends implement.

use async_trait::async_trait;
use mediaquery_core::{AppError, Label, ListFilter, MediaEntry, MediaType};

/// Catalog store abstraction trait
///
/// A single `upsert` or `delete` is atomic for its key; there are no cross-key
/// transactions. Backend transport or availability failures surface as
/// [`AppError::StoreUnavailable`] and listings never return partial results.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Write or overwrite the entry for `name`. Repeating the call with identical
    /// arguments leaves the catalog unchanged.
    async fn upsert(
        &self,
        name: &str,
        media_type: MediaType,
        labels: &[Label],
    ) -> Result<(), AppError>;

    /// Point lookup by name
    async fn get(&self, name: &str) -> Result<Option<MediaEntry>, AppError>;

    /// Remove the entry for `name`. Removing an absent entry succeeds.
    async fn delete(&self, name: &str) -> Result<(), AppError>;

    /// Entries matching every predicate set on `filter`, ordered by name
    async fn list(&self, filter: &ListFilter) -> Result<Vec<MediaEntry>, AppError>;

    /// Every entry in the catalog, ordered by name
    async fn list_all(&self) -> Result<Vec<MediaEntry>, AppError> {
        self.list(&ListFilter::default()).await
    }

    /// Cheap round trip to the backend, used by readiness checks
    async fn health_check(&self) -> Result<(), AppError>;

    /// Backend identifier for logs
    fn backend_name(&self) -> &'static str;
}
