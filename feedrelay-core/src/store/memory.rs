use super::{FeedRegistration, RegistrationStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Registrations kept in process memory, keyed by URL.
#[derive(Default)]
pub struct MemoryRegistrationStore {
    feeds: RwLock<BTreeMap<String, FeedRegistration>>,
}

impl MemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationStore for MemoryRegistrationStore {
    async fn get_by_public_key(&self, public_key: &str) -> Result<Option<FeedRegistration>, StoreError> {
        let feeds = self.feeds.read().await;
        Ok(feeds.values().find(|f| f.public_key == public_key).cloned())
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<FeedRegistration>, StoreError> {
        Ok(self.feeds.read().await.get(url).cloned())
    }

    async fn insert(&self, registration: FeedRegistration) -> Result<FeedRegistration, StoreError> {
        let mut feeds = self.feeds.write().await;
        Ok(feeds
            .entry(registration.url.clone())
            .or_insert(registration)
            .clone())
    }

    async fn delete_by_url(&self, url: &str) -> Result<bool, StoreError> {
        Ok(self.feeds.write().await.remove(url).is_some())
    }

    async fn search_by_url(&self, fragment: &str, limit: usize) -> Result<Vec<FeedRegistration>, StoreError> {
        let feeds = self.feeds.read().await;
        Ok(feeds
            .values()
            .filter(|f| f.url.contains(fragment))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.feeds.read().await.len() as u64)
    }
}
