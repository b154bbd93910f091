//! Fetch-through cache of parsed feeds.

use super::model::{ParsedFeed, parse_feed};
use crate::config::FeedCacheConfig;
use moka::sync::Cache;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while fetching a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or protocol failure
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body is not a feed the parser understands
    #[error("feed parse error: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),

    /// Neither the response nor the page it points to is a feed
    #[error("no feed found at {0}")]
    NoFeed(String),
}

/// Parsed feeds keyed by URL, evicted after a fixed time to live or when
/// the capacity is exceeded.
pub struct FeedCache {
    http_client: reqwest::Client,
    feeds: Cache<String, Arc<ParsedFeed>>,
}

impl FeedCache {
    pub fn new(config: &FeedCacheConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(config.fetch_timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            feeds: Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(config.time_to_live)
                .build(),
        }
    }

    /// The HTTP client used for feed requests.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Return the parsed feed at `url`, fetching it on a miss.
    ///
    /// Failures are not cached and not retried.
    pub async fn fetch(&self, url: &str) -> Result<Arc<ParsedFeed>, FetchError> {
        if let Some(feed) = self.feeds.get(url) {
            return Ok(feed);
        }

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = response.bytes().await?;
        let feed = Arc::new(parse_feed(&body)?);

        debug!(url = %url, items = feed.items.len(), "Feed fetched");
        self.feeds.insert(url.to_string(), feed.clone());
        Ok(feed)
    }
}
