//! Configuration module for feedrelay-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{ServerSettings, profile_config};
use feedrelay_core::config::{
    FeedCacheConfig, IdentityConfig, PollerConfig, ProfileConfig, ReplayConfig,
};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,

    #[error("SECRET environment variable not set")]
    MissingSecret,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerSettings,
    pub identity: IdentityConfig,
    pub feed_cache: FeedCacheConfig,
    pub profile: ProfileConfig,
    pub poller: PollerConfig,
    pub replay: ReplayConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Read the derivation secret from `SECRET`
    /// 4. Validate and build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let file_config: FileConfig = toml::from_str(&config_content)?;
        let secret = std::env::var("SECRET").map_err(|_| ConfigError::MissingSecret)?;
        self.build(file_config, secret)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn build(&self, mut file_config: FileConfig, secret: String) -> Result<LoadedConfig, ConfigError> {
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        validate(&file_config, &secret)?;

        Ok(LoadedConfig {
            server: ServerSettings::new(&file_config.server, &file_config.feeds),
            identity: IdentityConfig { secret },
            feed_cache: (&file_config.feeds).into(),
            profile: profile_config(&file_config.server, &file_config.feeds),
            poller: (&file_config.feeds).into(),
            replay: (&file_config.replay).into(),
        })
    }
}

fn validate(config: &FileConfig, secret: &str) -> Result<(), ConfigError> {
    if secret.trim().is_empty() {
        return Err(ConfigError::ValidationError("SECRET must not be empty".into()));
    }
    if config.replay.enabled && config.replay.relays.is_empty() {
        return Err(ConfigError::ValidationError(
            "replay is enabled but no relays are configured".into(),
        ));
    }
    if config.replay.enabled && (config.replay.max_events == 0 || config.replay.max_subroutines == 0) {
        return Err(ConfigError::ValidationError(
            "replay max_events and max_subroutines must be positive".into(),
        ));
    }
    let feeds = &config.feeds;
    if feeds.fetch_timeout_secs == 0 || feeds.cache_capacity == 0 || feeds.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "feed fetch timeout, cache capacity and poll interval must be positive".into(),
        ));
    }
    Ok(())
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loader() -> ConfigLoader {
        ConfigLoader::new("unused.toml", None)
    }

    #[test]
    fn test_build_converts_sections() {
        let file_config: FileConfig = toml::from_str(
            r#"
[server]
main_domain_name = "relay.example"

[feeds]
enable_auto_nip05_registration = true
poll_interval_secs = 30

[replay]
enabled = true
relays = ["wss://one.example"]
wait_time_for_relay_response_ms = 500
"#,
        )
        .unwrap();

        let loaded = loader().build(file_config, "s3cret".into()).unwrap();
        assert_eq!(loaded.identity.secret, "s3cret");
        assert_eq!(loaded.poller.interval, Duration::from_secs(30));
        assert_eq!(loaded.feed_cache.fetch_timeout, Duration::from_secs(5));
        assert!(loaded.profile.enable_auto_nip05);
        assert_eq!(loaded.profile.nip05_domain, "relay.example");
        assert!(loaded.server.enable_auto_nip05_registration);
        assert!(loaded.replay.enabled);
        assert_eq!(loaded.replay.wait_for_relay_response, Duration::from_millis(500));
        assert_eq!(loaded.replay.wait_between_batches, Duration::from_secs(60));
    }

    #[test]
    fn test_listen_override() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loaded = ConfigLoader::new("unused.toml", Some(addr))
            .build(FileConfig::default(), "s3cret".into())
            .unwrap();
        assert_eq!(loaded.server.listen, addr);
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let result = loader().build(FileConfig::default(), "  ".into());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_replay_without_relays_is_rejected() {
        let mut file_config = FileConfig::default();
        file_config.replay.enabled = true;
        let result = loader().build(file_config, "s3cret".into());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let mut file_config = FileConfig::default();
        file_config.replay.enabled = true;
        file_config.replay.relays = vec!["wss://one.example".into()];
        file_config.replay.max_subroutines = 0;
        assert!(loader().build(file_config, "s3cret".into()).is_err());

        let mut file_config = FileConfig::default();
        file_config.feeds.poll_interval_secs = 0;
        assert!(loader().build(file_config, "s3cret".into()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new("/nonexistent/feedrelay-config.toml", None).load();
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
