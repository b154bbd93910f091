//! Feed cache configuration.

use std::time::Duration;

/// Settings for fetching and caching parsed feeds.
#[derive(Debug, Clone)]
pub struct FeedCacheConfig {
    /// Timeout of a single feed HTTP request.
    pub fetch_timeout: Duration,
    /// How long a parsed feed stays cached.
    pub time_to_live: Duration,
    /// Maximum number of cached feeds.
    pub capacity: u64,
}

impl Default for FeedCacheConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            time_to_live: Duration::from_secs(19 * 60),
            capacity: 512,
        }
    }
}
