//! Catalog domain models

pub mod filter;
pub mod media;

pub use filter::ListFilter;
pub use media::{Label, MediaEntry, MediaType};
