use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// A registered feed and its derived keypair.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FeedRegistration {
    pub public_key: String,
    pub private_key: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct GetFeedByPublicKey {
    pub public_key: String,
}

impl Processor<GetFeedByPublicKey> for DatabaseProcessor {
    type Output = Option<FeedRegistration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetFeedByPublicKey")]
    async fn process(&self, query: GetFeedByPublicKey) -> Result<Option<FeedRegistration>, sqlx::Error> {
        sqlx::query_as::<_, FeedRegistration>(
            "SELECT public_key, private_key, url FROM feeds WHERE public_key = $1",
        )
        .bind(query.public_key)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetFeedByUrl {
    pub url: String,
}

impl Processor<GetFeedByUrl> for DatabaseProcessor {
    type Output = Option<FeedRegistration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetFeedByUrl")]
    async fn process(&self, query: GetFeedByUrl) -> Result<Option<FeedRegistration>, sqlx::Error> {
        sqlx::query_as::<_, FeedRegistration>(
            "SELECT public_key, private_key, url FROM feeds WHERE url = $1",
        )
        .bind(query.url)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Insert a registration, keeping the existing row when the URL is already
/// registered. Returns the stored registration.
pub struct InsertFeed {
    pub registration: FeedRegistration,
}

impl Processor<InsertFeed> for DatabaseProcessor {
    type Output = FeedRegistration;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertFeed")]
    async fn process(&self, insert: InsertFeed) -> Result<FeedRegistration, sqlx::Error> {
        let FeedRegistration {
            public_key,
            private_key,
            url,
        } = insert.registration;

        sqlx::query(
            r#"
            INSERT INTO feeds (public_key, private_key, url)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&public_key)
        .bind(&private_key)
        .bind(&url)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, FeedRegistration>(
            "SELECT public_key, private_key, url FROM feeds WHERE url = $1",
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct DeleteFeedByUrl {
    pub url: String,
}

impl Processor<DeleteFeedByUrl> for DatabaseProcessor {
    /// Number of deleted rows.
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteFeedByUrl")]
    async fn process(&self, delete: DeleteFeedByUrl) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM feeds WHERE url = $1")
            .bind(delete.url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Registrations whose URL contains `fragment`, ordered by URL.
pub struct SearchFeedsByUrl {
    pub fragment: String,
    pub limit: i64,
}

impl Processor<SearchFeedsByUrl> for DatabaseProcessor {
    type Output = Vec<FeedRegistration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SearchFeedsByUrl")]
    async fn process(&self, query: SearchFeedsByUrl) -> Result<Vec<FeedRegistration>, sqlx::Error> {
        sqlx::query_as::<_, FeedRegistration>(
            r#"
            SELECT public_key, private_key, url
            FROM feeds
            WHERE strpos(url, $1) > 0
            ORDER BY url
            LIMIT $2
            "#,
        )
        .bind(query.fragment)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct CountFeeds;

impl Processor<CountFeeds> for DatabaseProcessor {
    type Output = i64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CountFeeds")]
    async fn process(&self, _query: CountFeeds) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM feeds")
            .fetch_one(&self.pool)
            .await
    }
}
