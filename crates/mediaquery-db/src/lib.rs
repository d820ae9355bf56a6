//! Media Query catalog store
//!
//! This crate provides the `CatalogStore` trait and its backends. Every backend is keyed
//! by entry name alone and returns listings ordered by name, so callers observe the same
//! results regardless of which backend is configured.
//!
//! - [`DynamoCatalogStore`]: DynamoDB table with hash key `name`; listing is a full scan
//! - [`PostgresCatalogStore`]: one row per entry, filters evaluated in SQL
//! - [`InMemoryCatalogStore`]: ordered map with a label index, for development and tests

pub mod catalog;
pub mod dynamodb;
pub mod factory;
pub mod memory;
pub mod postgres;

// Re-export commonly used types
pub use catalog::CatalogStore;
pub use dynamodb::DynamoCatalogStore;
pub use factory::create_catalog_store;
pub use memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;
