//! Application state shared across all request handlers.

use crate::config::runtime::ServerSettings;
use crate::relay::SubscriptionRegistry;
use feedrelay_core::config::IdentityConfig;
use feedrelay_core::feed::FeedCache;
use feedrelay_core::query::QueryEngine;
use feedrelay_core::store::RegistrationStore;
use feedrelay_sdk::Event;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Registered feeds.
    pub store: Arc<dyn RegistrationStore>,
    /// Fetches feeds for registration and discovery.
    pub feed_cache: Arc<FeedCache>,
    /// Answers `REQ` filters.
    pub query: Arc<QueryEngine>,
    /// Open subscriptions of every connection; read by the poller.
    pub subscriptions: Arc<SubscriptionRegistry>,
    /// Notes emitted by the poller, fanned out to connections.
    pub live_events: broadcast::Sender<Arc<Event>>,
    /// Secret used to derive feed keys.
    pub identity: Arc<IdentityConfig>,
    /// Handler settings (can be reloaded via SIGHUP).
    pub settings: Arc<RwLock<ServerSettings>>,
}

impl AppState {
    /// Get a read lock on the handler settings.
    pub async fn settings(&self) -> tokio::sync::RwLockReadGuard<'_, ServerSettings> {
        self.settings.read().await
    }

    /// Update the handler settings (used during SIGHUP reload).
    pub async fn update_settings(&self, settings: ServerSettings) {
        *self.settings.write().await = settings;
    }
}
