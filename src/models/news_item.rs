//! News item model

use serde::{Deserialize, Serialize};

/// One entry of the news feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline
    pub title: String,
    /// Short description
    pub description: String,
    /// Thumbnail URL, used as the image cache key
    pub thumbnail_url: String,
}

impl NewsItem {
    /// Create a new item
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        thumbnail_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            thumbnail_url: thumbnail_url.into(),
        }
    }

    /// Whether the item has a thumbnail to load
    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail_url.trim().is_empty()
    }
}
