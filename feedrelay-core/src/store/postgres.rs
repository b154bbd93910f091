use super::{FeedRegistration, RegistrationStore, StoreError};
use crate::entities::feed_registration::{
    CountFeeds, DeleteFeedByUrl, GetFeedByPublicKey, GetFeedByUrl, InsertFeed, SearchFeedsByUrl,
};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;

/// Registrations kept in the `feeds` table.
pub struct PgRegistrationStore {
    db: DatabaseProcessor,
}

impl PgRegistrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn get_by_public_key(&self, public_key: &str) -> Result<Option<FeedRegistration>, StoreError> {
        Ok(self
            .db
            .process(GetFeedByPublicKey {
                public_key: public_key.to_string(),
            })
            .await?)
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<FeedRegistration>, StoreError> {
        Ok(self
            .db
            .process(GetFeedByUrl {
                url: url.to_string(),
            })
            .await?)
    }

    async fn insert(&self, registration: FeedRegistration) -> Result<FeedRegistration, StoreError> {
        Ok(self.db.process(InsertFeed { registration }).await?)
    }

    async fn delete_by_url(&self, url: &str) -> Result<bool, StoreError> {
        let deleted = self
            .db
            .process(DeleteFeedByUrl {
                url: url.to_string(),
            })
            .await?;
        Ok(deleted > 0)
    }

    async fn search_by_url(&self, fragment: &str, limit: usize) -> Result<Vec<FeedRegistration>, StoreError> {
        Ok(self
            .db
            .process(SearchFeedsByUrl {
                fragment: fragment.to_string(),
                limit: i64::try_from(limit).unwrap_or(i64::MAX),
            })
            .await?)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count = self.db.process(CountFeeds).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
