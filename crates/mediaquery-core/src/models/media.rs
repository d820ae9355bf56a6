use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;

/// Media type enum
///
/// Only `Image` is produced by the ingest path; `Video` is reserved for a video
/// pipeline that is provisioned but not wired to any handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            other => Err(AppError::InvalidInput(format!(
                "Unknown media type '{}', expected one of: image, video",
                other
            ))),
        }
    }
}

/// One concept detected in a media object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Label {
    pub name: String,
    /// Detection confidence in percent (0-100), when the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence: Some(confidence),
        }
    }
}

/// Catalog record for a single stored object, keyed by its storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MediaEntry {
    /// Object storage key; unique across the catalog
    pub name: String,
    pub media_type: MediaType,
    /// Labels in the order the vision service returned them
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl MediaEntry {
    pub fn new(name: impl Into<String>, media_type: MediaType, labels: Vec<Label>) -> Self {
        Self {
            name: name.into(),
            media_type,
            labels,
        }
    }

    /// Whether any label carries exactly this name
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.name == label)
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }
}
