//! HTTP error response body
//!
//! The `IntoResponse` implementation for `AppError` lives in the API crate because of the
//! orphan rule; this crate only owns the wire shape.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every HTTP endpoint: `{"Code": ..., "Message": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code, e.g. `NotFoundError`
    #[serde(rename = "Code")]
    pub code: String,
    /// Human-readable message
    #[serde(rename = "Message")]
    pub message: String,
    /// Internal error chain; only present outside production
    #[serde(rename = "Details", default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
