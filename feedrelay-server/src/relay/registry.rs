//! Open subscriptions of every connected client.

use dashmap::DashMap;
use feedrelay_core::subscriptions::ListeningFilters;
use feedrelay_sdk::Filter;
use std::sync::atomic::{AtomicU64, Ordering};

pub type ConnectionId = u64;

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    next_connection: AtomicU64,
    subscriptions: DashMap<(ConnectionId, String), Vec<Filter>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a new connection.
    pub fn connect(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    /// Open or replace a subscription.
    pub fn register(&self, connection: ConnectionId, subscription_id: &str, filters: Vec<Filter>) {
        self.subscriptions
            .insert((connection, subscription_id.to_string()), filters);
    }

    pub fn unregister(&self, connection: ConnectionId, subscription_id: &str) {
        self.subscriptions
            .remove(&(connection, subscription_id.to_string()));
    }

    /// Drop every subscription of a closed connection.
    pub fn disconnect(&self, connection: ConnectionId) {
        self.subscriptions.retain(|(owner, _), _| *owner != connection);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl ListeningFilters for SubscriptionRegistry {
    fn listening_filters(&self) -> Vec<Filter> {
        self.subscriptions
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }
}
