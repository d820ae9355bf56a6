//! Media Query API Library
//!
//! This crate provides the HTTP query API over the media catalog and the application
//! setup that wires the catalog, the label detector and the notification consumer.

// Module declarations
mod api_doc;
mod handlers;

// Public modules
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use api_doc::ApiDoc;
pub use error::HttpAppError;
pub use setup::routes::setup_routes;
pub use state::AppState;
