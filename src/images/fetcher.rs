//! Network fetching and decoding of a single thumbnail.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;

use super::Thumbnail;

/// Default cap on a downloaded thumbnail body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Why a thumbnail could not be produced.
///
/// All variants are local to one key; callers treat them as "no result".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The key is not an absolute http(s) URL.
    #[error("invalid image identifier {key:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected key
        key: String,
        /// What was wrong with it
        reason: String,
    },
    /// Connecting, reading, or a non-success HTTP status.
    #[error("transport failure: {0}")]
    TransportFailure(String),
    /// The body was not a decodable image.
    #[error("decode failure: {0}")]
    DecodeFailure(String),
}

/// Produces a decoded thumbnail for a key.
///
/// Each invocation is independent; implementations must be safe to call from
/// many tasks at once.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetch and decode the image identified by `key`.
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Thumbnail, FetchError>> + Send;
}

/// Fetcher backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), DEFAULT_MAX_BODY_BYTES)
    }
}

impl HttpFetcher {
    /// Create a fetcher with a per-request timeout and a body size cap.
    pub fn new(timeout: Duration, max_body_bytes: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("thumbfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            max_body_bytes,
        }
    }

    /// Create a fetcher from the application config.
    pub fn from_config(config: &crate::Config) -> Self {
        Self::new(
            Duration::from_secs(config.request_timeout_secs),
            config.max_body_bytes,
        )
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, key: &str) -> Result<Thumbnail, FetchError> {
        let url = parse_key(key)?;
        tracing::debug!("Downloading thumbnail: {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::TransportFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::TransportFailure(format!("HTTP {status}")));
        }

        if let Some(length) = response.content_length()
            && length > self.max_body_bytes as u64
        {
            return Err(FetchError::TransportFailure(format!(
                "body of {length} bytes exceeds limit of {}",
                self.max_body_bytes
            )));
        }

        // Consumes the response, so the connection is released before decoding.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::TransportFailure(e.to_string()))?;

        if bytes.len() > self.max_body_bytes {
            return Err(FetchError::TransportFailure(format!(
                "body of {} bytes exceeds limit of {}",
                bytes.len(),
                self.max_body_bytes
            )));
        }

        decode_thumbnail(&bytes)
    }
}

/// Validate a key as an absolute http(s) URL.
pub fn parse_key(key: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidIdentifier {
        key: key.to_string(),
        reason,
    };

    let url = Url::parse(key.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other:?}"))),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Decode raw image bytes.
pub fn decode_thumbnail(bytes: &[u8]) -> Result<Thumbnail, FetchError> {
    image::load_from_memory(bytes)
        .map(Thumbnail::new)
        .map_err(|e| FetchError::DecodeFailure(e.to_string()))
}
