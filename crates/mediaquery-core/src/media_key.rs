//! Supported media key policy
//!
//! Decides which object keys the ingest path handles. Matching is a case-sensitive
//! suffix check: `photo.JPG` is not a `.jpg` key.

/// Default suffixes for keys treated as images
pub const DEFAULT_SUPPORTED_EXTENSIONS: &[&str] = &[".jpg", ".png"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaKeyPolicy {
    extensions: Vec<String>,
}

impl Default for MediaKeyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()))
    }
}

impl MediaKeyPolicy {
    pub fn new(extensions: impl IntoIterator<Item = String>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated suffix list such as `.jpg,.png`. Entries are trimmed
    /// but not case-folded.
    pub fn from_csv(value: &str) -> Self {
        Self::new(value.split(',').map(|s| s.trim().to_string()))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_supported_media_key(&self, key: &str) -> bool {
        self.extensions.iter().any(|ext| key.ends_with(ext.as_str()))
    }
}
