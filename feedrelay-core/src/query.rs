//! On-demand answers to subscription filters.
//!
//! Nothing is stored: every query resolves the requested authors, fetches
//! their feeds through the cache and synthesizes fresh signed events. Only
//! author, kind and time-range constraints are supported; a filter with ids
//! or tag constraints always yields nothing.

use crate::events::ReplayItem;
use crate::processors::replayer::Replayer;
use crate::source::FeedSource;
use crate::watermark::EmissionWatermark;
use feedrelay_sdk::{Event, Filter, KIND_METADATA, KIND_TEXT_NOTE};
use std::sync::Arc;
use tracing::debug;

pub struct QueryEngine {
    source: Arc<FeedSource>,
    watermark: Arc<EmissionWatermark>,
    replayer: Arc<Replayer>,
}

impl QueryEngine {
    pub fn new(source: Arc<FeedSource>, watermark: Arc<EmissionWatermark>, replayer: Arc<Replayer>) -> Self {
        Self {
            source,
            watermark,
            replayer,
        }
    }

    /// Events matching `filter`.
    ///
    /// Every returned event is also submitted to the replayer as one batch.
    pub async fn evaluate(&self, filter: &Filter) -> Vec<Event> {
        if filter.has_id_or_tag_constraints() {
            debug!("Filter has ids or tags, returning nothing");
            return Vec::new();
        }

        let mut accepted: Vec<ReplayItem> = Vec::new();
        for author in filter.authors.iter().flatten() {
            let Some(resolved) = self.source.resolve(author).await else {
                continue;
            };

            if filter.wants_kind(KIND_METADATA) {
                if let Some(profile) = self.source.profile_event(&resolved) {
                    if filter.in_time_range(profile.event.created_at) {
                        accepted.push(profile);
                    }
                }
            }

            if filter.wants_kind(KIND_TEXT_NOTE) {
                let notes: Vec<ReplayItem> = self
                    .source
                    .note_events(&resolved)
                    .into_iter()
                    .filter(|note| filter.in_time_range(note.event.created_at))
                    .collect();
                if let Some(newest) = notes.iter().map(|note| note.event.created_at).max() {
                    self.watermark.advance(&resolved.registration.url, newest);
                }
                accepted.extend(notes);
            }
        }

        let events = accepted.iter().map(|item| item.event.clone()).collect();
        self.replayer.submit(accepted).await;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, ReplayConfig};
    use crate::source::tests::{registered_feed, rss, source};
    use wiremock::MockServer;

    const T0: &str = "Tue, 14 Nov 2023 22:13:20 GMT"; // 1_700_000_000
    const T1: &str = "Tue, 14 Nov 2023 22:13:30 GMT"; // 1_700_000_010

    async fn engine(server: &MockServer) -> (QueryEngine, Arc<EmissionWatermark>, String, String) {
        let (store, identity) = registered_feed(server, rss(&[("First", T0), ("Second", T1)])).await;
        let watermark = Arc::new(EmissionWatermark::new());
        let replayer = Arc::new(Replayer::new(ConfigStore::new(ReplayConfig::default())));
        let engine = QueryEngine::new(Arc::new(source(store)), watermark.clone(), replayer);
        (engine, watermark, identity.public_key, identity.url)
    }

    #[tokio::test]
    async fn test_ids_or_tags_yield_nothing() {
        let server = MockServer::start().await;
        let (engine, _, pubkey, _) = engine(&server).await;

        let by_id = Filter::new().authors([pubkey.clone()]).ids(["abc"]);
        assert!(engine.evaluate(&by_id).await.is_empty());

        let by_tag = Filter::new().authors([pubkey]).tag("e", ["abc"]);
        assert!(engine.evaluate(&by_tag).await.is_empty());
    }

    #[tokio::test]
    async fn test_profile_and_dated_notes() {
        let server = MockServer::start().await;
        let (engine, watermark, pubkey, url) = engine(&server).await;

        let events = engine.evaluate(&Filter::new().authors([pubkey.clone()])).await;
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        // The undated item produces no note.
        assert_eq!(kinds, [KIND_METADATA, KIND_TEXT_NOTE, KIND_TEXT_NOTE]);
        assert!(events.iter().all(|e| e.pubkey == pubkey));
        assert_eq!(watermark.get(&url), Some(1_700_000_010));
    }

    #[tokio::test]
    async fn test_metadata_before_since_is_excluded() {
        let server = MockServer::start().await;
        let (engine, _, pubkey, _) = engine(&server).await;

        let filter = Filter::new()
            .authors([pubkey])
            .kinds([KIND_METADATA])
            .since(1_700_000_001);
        assert!(engine.evaluate(&filter).await.is_empty());
    }

    #[tokio::test]
    async fn test_time_range_filters_notes() {
        let server = MockServer::start().await;
        let (engine, watermark, pubkey, url) = engine(&server).await;

        let filter = Filter::new()
            .authors([pubkey.clone()])
            .kinds([KIND_TEXT_NOTE])
            .until(1_700_000_005);
        let events = engine.evaluate(&filter).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].created_at, 1_700_000_000);
        assert_eq!(watermark.get(&url), Some(1_700_000_000));

        // A later, wider query raises the watermark; a narrower one never lowers it.
        engine
            .evaluate(&Filter::new().authors([pubkey]).kinds([KIND_TEXT_NOTE]))
            .await;
        assert_eq!(watermark.get(&url), Some(1_700_000_010));
        engine.evaluate(&filter).await;
        assert_eq!(watermark.get(&url), Some(1_700_000_010));
    }

    #[tokio::test]
    async fn test_unknown_author_and_no_authors() {
        let server = MockServer::start().await;
        let (engine, _, _, _) = engine(&server).await;
        assert!(engine.evaluate(&Filter::new().authors(["ab".repeat(32)])).await.is_empty());
        assert!(engine.evaluate(&Filter::new().kinds([KIND_TEXT_NOTE])).await.is_empty());
    }
}
