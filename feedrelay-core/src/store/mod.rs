//! Registration store.
//!
//! Maps feed URLs to their derived keypairs. The relay only reads
//! registrations, except for pruning feeds that can no longer be fetched.

mod memory;
mod postgres;

pub use memory::MemoryRegistrationStore;
pub use postgres::PgRegistrationStore;

pub use crate::entities::feed_registration::FeedRegistration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

/// Errors returned by a registration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn get_by_public_key(&self, public_key: &str) -> Result<Option<FeedRegistration>, StoreError>;

    async fn get_by_url(&self, url: &str) -> Result<Option<FeedRegistration>, StoreError>;

    /// Store a registration. When the URL is already registered the existing
    /// registration is kept and returned.
    async fn insert(&self, registration: FeedRegistration) -> Result<FeedRegistration, StoreError>;

    /// Returns whether a registration was removed.
    async fn delete_by_url(&self, url: &str) -> Result<bool, StoreError>;

    /// Registrations whose URL contains `fragment`, ordered by URL.
    async fn search_by_url(&self, fragment: &str, limit: usize) -> Result<Vec<FeedRegistration>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// Remove the registration of a feed that failed to fetch or parse.
///
/// Never fails; the outcome is logged.
pub async fn delete_invalid_feed(store: &dyn RegistrationStore, url: &str) {
    match store.delete_by_url(url).await {
        Ok(true) => info!(url = %url, "Deleted invalid feed"),
        Ok(false) => {}
        Err(e) => error!(url = %url, error = %e, "Failed to delete invalid feed"),
    }
}
