//! Runtime configuration built from the file sections.
//!
//! Processor settings are the `feedrelay-core` config types; this module
//! converts the file sections into them.

use crate::config::file;
use feedrelay_core::config::{FeedCacheConfig, PollerConfig, ProfileConfig, ReplayConfig};
use std::net::SocketAddr;
use std::time::Duration;

/// Settings used by the HTTP and relay handlers.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen: SocketAddr,
    pub main_domain_name: String,
    pub owner_public_key: String,
    pub version: String,
    pub enable_auto_nip05_registration: bool,
}

impl ServerSettings {
    pub fn new(server: &file::ServerConfig, feeds: &file::FeedsConfig) -> Self {
        Self {
            listen: server.listen,
            main_domain_name: server.main_domain_name.clone(),
            owner_public_key: server.owner_public_key.clone(),
            version: server.version.clone(),
            enable_auto_nip05_registration: feeds.enable_auto_nip05_registration,
        }
    }
}

impl From<&file::FeedsConfig> for FeedCacheConfig {
    fn from(feeds: &file::FeedsConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_secs(feeds.fetch_timeout_secs),
            time_to_live: Duration::from_secs(feeds.cache_ttl_secs),
            capacity: feeds.cache_capacity,
        }
    }
}

impl From<&file::FeedsConfig> for PollerConfig {
    fn from(feeds: &file::FeedsConfig) -> Self {
        Self {
            interval: Duration::from_secs(feeds.poll_interval_secs),
        }
    }
}

/// The advertised NIP-05 domain comes from the `[server]` section.
pub fn profile_config(server: &file::ServerConfig, feeds: &file::FeedsConfig) -> ProfileConfig {
    ProfileConfig {
        enable_auto_nip05: feeds.enable_auto_nip05_registration,
        nip05_domain: server.main_domain_name.clone(),
        default_picture_url: feeds.default_profile_picture_url.clone(),
    }
}

impl From<&file::ReplayConfig> for ReplayConfig {
    fn from(replay: &file::ReplayConfig) -> Self {
        Self {
            enabled: replay.enabled,
            relays: replay.relays.clone(),
            wait_between_batches: Duration::from_millis(replay.wait_time_between_batches_ms),
            wait_for_relay_response: Duration::from_millis(replay.wait_time_for_relay_response_ms),
            max_events: replay.max_events,
            max_subroutines: replay.max_subroutines,
        }
    }
}
