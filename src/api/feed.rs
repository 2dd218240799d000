//! News feed client
//!
//! The feed is a JSON document of the form
//! `{ "data": [ { "name", "description", "picSmall" }, ... ] }`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::models::NewsItem;

/// Why the feed could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Request could not be sent or the body could not be read
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Server answered with a non-success status
    #[error("feed returned HTTP {0}")]
    Status(StatusCode),
    /// Body was not the expected JSON
    #[error("malformed feed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// News feed client
#[derive(Clone)]
pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    /// Create a new feed client
    pub fn new(url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("thumbfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: url.trim().to_string(),
        }
    }

    /// Feed URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download and parse the feed
    pub async fn fetch(&self) -> Result<Vec<NewsItem>, FeedError> {
        tracing::debug!("Fetching feed: {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let body = response.text().await?;
        let items = parse_feed(&body)?;
        tracing::debug!("Feed returned {} items", items.len());
        Ok(items)
    }
}

/// Parse a feed document
pub fn parse_feed(json: &str) -> Result<Vec<NewsItem>, FeedError> {
    let feed: FeedResponse = serde_json::from_str(json)?;
    Ok(feed
        .data
        .into_iter()
        .map(FeedEntry::into_news_item)
        .collect())
}

// Wire types

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    data: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "picSmall")]
    pic_small: String,
}

impl FeedEntry {
    fn into_news_item(self) -> NewsItem {
        NewsItem {
            title: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            thumbnail_url: self.pic_small.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed() {
        let json = r#"{
            "status": 1,
            "data": [
                {"id": 1, "name": " Rust basics ", "picSmall": "http://img.example.com/1.jpg",
                 "picBig": "http://img.example.com/1-big.jpg", "description": "Ownership", "learner": 12},
                {"id": 2, "name": "Async", "picSmall": "http://img.example.com/2.jpg", "description": "Tokio"}
            ],
            "msg": "ok"
        }"#;

        let items = parse_feed(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            NewsItem::new("Rust basics", "Ownership", "http://img.example.com/1.jpg")
        );
        assert_eq!(items[1].thumbnail_url, "http://img.example.com/2.jpg");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let items = parse_feed(r#"{"data": [{"name": "No picture"}]}"#).unwrap();
        assert_eq!(items.len(), 1);
        assert!(!items[0].has_thumbnail());
        assert!(items[0].description.is_empty());
    }

    #[test]
    fn test_missing_data_is_empty() {
        assert!(parse_feed(r#"{"status": 0}"#).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_feed() {
        assert!(matches!(parse_feed("<html>"), Err(FeedError::Parse(_))));
        assert!(matches!(
            parse_feed(r#"{"data": "nope"}"#),
            Err(FeedError::Parse(_))
        ));
    }
}
