//! Configuration types for feedrelay.
//!
//! These types represent the validated runtime configuration used by the
//! processors. Loading and parsing the configuration file is handled by the
//! server crate.

mod config_store;
mod feed_cache;
mod identity;
mod poller;
mod profile;
mod replay;

pub use config_store::ConfigStore;
pub use feed_cache::FeedCacheConfig;
pub use identity::IdentityConfig;
pub use poller::PollerConfig;
pub use profile::ProfileConfig;
pub use replay::ReplayConfig;
