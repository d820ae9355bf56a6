use serde::{Deserialize, Serialize};

use super::media::{MediaEntry, MediaType};

/// Optional predicates for catalog listing. All set predicates must hold (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Entry name must begin with this prefix
    pub startswith: Option<String>,
    /// Entry media type must be exactly this type
    pub media_type: Option<MediaType>,
    /// Entry must carry a label with exactly this name
    pub label: Option<String>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn startswith(mut self, prefix: impl Into<String>) -> Self {
        self.startswith = Some(prefix.into());
        self
    }

    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True when no predicate is set, i.e. the filter matches every entry.
    pub fn is_empty(&self) -> bool {
        self.startswith.is_none() && self.media_type.is_none() && self.label.is_none()
    }

    pub fn matches(&self, entry: &MediaEntry) -> bool {
        if let Some(prefix) = &self.startswith {
            if !entry.name.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(media_type) = self.media_type {
            if entry.media_type != media_type {
                return false;
            }
        }
        if let Some(label) = &self.label {
            if !entry.has_label(label) {
                return false;
            }
        }
        true
    }
}
