//! TOML file configuration structures.
//!
//! These structs directly map to the `feedrelay-config.toml` file format.
//! Every section and field is optional; missing values take the defaults
//! below.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub feeds: FeedsConfig,
    pub replay: ReplayConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    pub listen: SocketAddr,
    /// Domain used in advertised NIP-05 handles.
    pub main_domain_name: String,
    /// Hex public key returned for the `_` NIP-05 name.
    pub owner_public_key: String,
    /// Version string reported by the relay information document.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            main_domain_name: String::new(),
            owner_public_key: String::new(),
            version: "unknown".to_string(),
        }
    }
}

/// Feed fetching and profile section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub default_profile_picture_url: String,
    pub enable_auto_nip05_registration: bool,
    pub fetch_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub poll_interval_secs: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            default_profile_picture_url: "https://i.imgur.com/MaceU96.png".to_string(),
            enable_auto_nip05_registration: false,
            fetch_timeout_secs: 5,
            cache_ttl_secs: 19 * 60,
            cache_capacity: 512,
            poll_interval_secs: 20 * 60,
        }
    }
}

/// Replay-to-relays section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub enabled: bool,
    pub relays: Vec<String>,
    pub wait_time_between_batches_ms: u64,
    pub wait_time_for_relay_response_ms: u64,
    pub max_events: usize,
    pub max_subroutines: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            relays: Vec::new(),
            wait_time_between_batches_ms: 60_000,
            wait_time_for_relay_response_ms: 3_000,
            max_events: 20,
            max_subroutines: 20,
        }
    }
}
