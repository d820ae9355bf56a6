//! Media Query Core Library
//!
//! This crate provides the catalog domain models, error types, configuration, and the
//! supported-media-key policy shared by every Media Query component.

pub mod config;
pub mod error;
pub mod media_key;
pub mod models;

// Re-export commonly used types
pub use config::{CatalogBackend, Config, LabelDetectionSettings, QueueSettings};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use media_key::MediaKeyPolicy;
pub use models::{Label, ListFilter, MediaEntry, MediaType};
