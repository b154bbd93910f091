//! FeedPoller processor.
//!
//! The FeedPoller is responsible for:
//! - Waking up once per polling interval
//! - Collecting the filters of every open subscription that asks for notes
//! - Emitting notes newer than the feed's watermark on the live-update
//!   channel, one at a time
//! - Submitting everything emitted in a cycle to the replayer as one batch

use crate::config::PollerConfig;
use crate::events::{LiveEventSender, ReplayItem};
use crate::processors::replayer::Replayer;
use crate::source::FeedSource;
use crate::subscriptions::ListeningFilters;
use crate::watermark::EmissionWatermark;
use feedrelay_sdk::KIND_TEXT_NOTE;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct FeedPoller {
    source: Arc<FeedSource>,
    watermark: Arc<EmissionWatermark>,
    replayer: Arc<Replayer>,
    filters: Arc<dyn ListeningFilters>,
    live_tx: LiveEventSender,
    config: PollerConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl FeedPoller {
    pub fn new(
        source: Arc<FeedSource>,
        watermark: Arc<EmissionWatermark>,
        replayer: Arc<Replayer>,
        filters: Arc<dyn ListeningFilters>,
        live_tx: LiveEventSender,
        config: PollerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            watermark,
            replayer,
            filters,
            live_tx,
            config,
            shutdown_rx,
        }
    }

    /// Run the FeedPoller until shutdown.
    pub async fn run(mut self) {
        info!(interval = ?self.config.interval, "FeedPoller started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("FeedPoller received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(self.config.interval) => {
                    let emitted = self.poll_once().await;
                    debug!(emitted, "Polling cycle finished");
                }
            }
        }

        info!("FeedPoller shutdown complete");
    }

    /// Run one polling cycle. Returns the number of emitted notes.
    pub async fn poll_once(&self) -> usize {
        let filters = self.filters.listening_filters();
        info!("checking for updates; {} filters active", filters.len());

        let mut batch: Vec<ReplayItem> = Vec::new();
        for filter in filters.iter().filter(|f| f.wants_kind(KIND_TEXT_NOTE)) {
            for author in filter.authors.iter().flatten() {
                let Some(resolved) = self.source.resolve(author).await else {
                    continue;
                };
                let url = &resolved.registration.url;

                let fresh: Vec<ReplayItem> = self
                    .source
                    .note_events(&resolved)
                    .into_iter()
                    .filter(|note| self.watermark.should_emit(url, note.event.created_at))
                    .collect();

                for note in &fresh {
                    if self.live_tx.send(note.event.clone()).await.is_err() {
                        warn!(url = %url, "Live-update channel closed, note not delivered");
                    }
                }
                if let Some(newest) = fresh.iter().map(|note| note.event.created_at).max() {
                    self.watermark.advance(url, newest);
                }
                batch.extend(fresh);
            }
        }

        let emitted = batch.len();
        self.replayer.submit(batch).await;
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, ReplayConfig};
    use crate::events::live_event_channel;
    use crate::source::tests::{registered_feed, rss, source};
    use feedrelay_sdk::{Filter, KIND_METADATA};
    use std::time::Duration;
    use wiremock::MockServer;

    const T0: &str = "Tue, 14 Nov 2023 22:13:20 GMT"; // 1_700_000_000
    const T1: &str = "Tue, 14 Nov 2023 22:13:30 GMT"; // 1_700_000_010

    fn poller(
        source: Arc<FeedSource>,
        watermark: Arc<EmissionWatermark>,
        filters: Vec<Filter>,
        live_tx: LiveEventSender,
    ) -> (FeedPoller, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let replayer = Arc::new(Replayer::new(ConfigStore::new(ReplayConfig::default())));
        let poller = FeedPoller::new(
            source,
            watermark,
            replayer,
            Arc::new(filters),
            live_tx,
            PollerConfig::default(),
            shutdown_rx,
        );
        (poller, shutdown_tx)
    }

    #[tokio::test]
    async fn test_only_notes_past_watermark_are_emitted() {
        let server = MockServer::start().await;
        let (store, identity) = registered_feed(&server, rss(&[("First", T0), ("Second", T1)])).await;
        let watermark = Arc::new(EmissionWatermark::new());
        watermark.advance(&identity.url, 1_700_000_000);

        let (live_tx, mut live_rx) = live_event_channel();
        let filters = vec![Filter::new().authors([identity.public_key.clone()])];
        let (poller, _shutdown) = poller(Arc::new(source(store)), watermark.clone(), filters, live_tx);

        let cycle = tokio::spawn(async move {
            let first = poller.poll_once().await;
            let second = poller.poll_once().await;
            (first, second)
        });

        let event = live_rx.recv().await.unwrap();
        assert_eq!(event.created_at, 1_700_000_010);
        assert_eq!(event.kind, KIND_TEXT_NOTE);

        let (first, second) = cycle.await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert!(live_rx.try_recv().is_err());
        assert_eq!(watermark.get(&identity.url), Some(1_700_000_010));
    }

    #[tokio::test]
    async fn test_metadata_only_filters_are_ignored() {
        let server = MockServer::start().await;
        let (store, identity) = registered_feed(&server, rss(&[("First", T0)])).await;
        let watermark = Arc::new(EmissionWatermark::new());

        let (live_tx, mut live_rx) = live_event_channel();
        let filters = vec![
            Filter::new()
                .authors([identity.public_key.clone()])
                .kinds([KIND_METADATA]),
        ];
        let (poller, _shutdown) = poller(Arc::new(source(store)), watermark.clone(), filters, live_tx);

        assert_eq!(poller.poll_once().await, 0);
        assert!(live_rx.try_recv().is_err());
        assert_eq!(watermark.get(&identity.url), None);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let server = MockServer::start().await;
        let (store, _) = registered_feed(&server, rss(&[])).await;
        let (live_tx, _live_rx) = live_event_channel();
        let (poller, shutdown_tx) = poller(
            Arc::new(source(store)),
            Arc::new(EmissionWatermark::new()),
            Vec::new(),
            live_tx,
        );

        let handle = tokio::spawn(poller.run());
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
