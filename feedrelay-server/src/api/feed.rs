use axum::{
    Json,
    extract::{Query, State},
};
use feedrelay_core::feed::discover_feed_url;
use feedrelay_core::store::FeedRegistration;
use feedrelay_sdk::FeedIdentity;
use feedrelay_sdk::objects::{FeedEntry, RegisterFeedQuery, SearchFeedsQuery, SearchFeedsResponse};

use super::ApiError;
use crate::state::AppState;

/// Longest search result list.
const SEARCH_LIMIT: usize = 50;
/// Queries must be longer than this.
const MIN_SEARCH_CHARS: usize = 4;

/// `GET /api/feed?url=...`: register a feed.
///
/// `url` may point at the feed itself or at a page advertising one. The
/// feed must parse. Registering the same feed twice returns the same keys.
pub async fn register_feed(
    State(state): State<AppState>,
    Query(query): Query<RegisterFeedQuery>,
) -> Result<Json<FeedEntry>, ApiError> {
    let url = query.url.unwrap_or_default();
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("Could not find a feed URL in there...".into()));
    }

    let feed_url = discover_feed_url(state.feed_cache.http_client(), url)
        .await
        .map_err(|e| {
            tracing::debug!(url = %url, error = %e, "Feed discovery failed");
            ApiError::BadRequest("Could not find a feed URL in there...".into())
        })?;

    state
        .feed_cache
        .fetch(&feed_url)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Bad feed: {e}")))?;

    let identity = FeedIdentity::derive(&feed_url, &state.identity.secret)
        .map_err(|e| ApiError::Internal(format!("bad private key: {e}")))?;

    let registration = state
        .store
        .insert(FeedRegistration {
            public_key: identity.public_key,
            private_key: identity.private_key,
            url: identity.url,
        })
        .await?;
    tracing::info!(url = %registration.url, pubkey = %registration.public_key, "Feed registered");

    FeedEntry::new(registration.public_key, registration.url)
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `GET /api/search?query=...`: registered feeds whose URL contains `query`.
pub async fn search_feeds(
    State(state): State<AppState>,
    Query(query): Query<SearchFeedsQuery>,
) -> Result<Json<SearchFeedsResponse>, ApiError> {
    let query = query.query.unwrap_or_default();
    if query.chars().count() <= MIN_SEARCH_CHARS {
        return Err(ApiError::BadRequest(
            "Please enter more than 5 characters to search".into(),
        ));
    }

    let count = state.store.count().await?;
    let entries: Vec<FeedEntry> = state
        .store
        .search_by_url(&query, SEARCH_LIMIT)
        .await?
        .into_iter()
        .filter_map(|registration| FeedEntry::new(registration.public_key, registration.url).ok())
        .collect();

    Ok(Json(SearchFeedsResponse {
        count,
        filtered_count: entries.len() as u64,
        entries,
    }))
}
