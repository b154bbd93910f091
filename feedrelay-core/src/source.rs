//! Per-author feed resolution shared by the query engine and the poller.

use crate::events::ReplayItem;
use crate::feed::{FeedCache, ParsedFeed};
use crate::store::{FeedRegistration, RegistrationStore, delete_invalid_feed};
use crate::synthesis::Synthesizer;
use feedrelay_sdk::event::now;
use std::sync::Arc;
use tracing::{debug, warn};

/// A registration together with its current feed content.
pub struct ResolvedFeed {
    pub registration: FeedRegistration,
    pub feed: Arc<ParsedFeed>,
}

/// Looks up authors, fetches their feeds and signs synthesized events.
pub struct FeedSource {
    store: Arc<dyn RegistrationStore>,
    cache: Arc<FeedCache>,
    synthesizer: Synthesizer,
}

impl FeedSource {
    pub fn new(store: Arc<dyn RegistrationStore>, cache: Arc<FeedCache>, synthesizer: Synthesizer) -> Self {
        Self {
            store,
            cache,
            synthesizer,
        }
    }

    /// Resolve an author public key to its registration and parsed feed.
    ///
    /// Unknown authors yield `None`. A feed that cannot be fetched or parsed
    /// has its registration deleted and also yields `None`.
    pub async fn resolve(&self, author: &str) -> Option<ResolvedFeed> {
        let public_key = author.trim();
        let registration = match self.store.get_by_public_key(public_key).await {
            Ok(Some(registration)) => registration,
            Ok(None) => {
                debug!(pubkey = %public_key, "Unknown author");
                return None;
            }
            Err(e) => {
                warn!(pubkey = %public_key, error = %e, "Failed to look up registration");
                return None;
            }
        };

        match self.cache.fetch(&registration.url).await {
            Ok(feed) => Some(ResolvedFeed { registration, feed }),
            Err(e) => {
                warn!(url = %registration.url, error = %e, "Failed to fetch feed");
                delete_invalid_feed(self.store.as_ref(), &registration.url).await;
                None
            }
        }
    }

    /// The signed profile event of a resolved feed.
    pub fn profile_event(&self, resolved: &ResolvedFeed) -> Option<ReplayItem> {
        let ResolvedFeed { registration, feed } = resolved;
        let unsigned = match self
            .synthesizer
            .profile(&registration.public_key, feed, &registration.url)
        {
            Ok(unsigned) => unsigned,
            Err(e) => {
                warn!(url = %registration.url, error = %e, "Failed to build profile");
                return None;
            }
        };
        match unsigned.sign(&registration.private_key) {
            Ok(event) => Some(ReplayItem::new(event, registration.private_key.as_str())),
            Err(e) => {
                warn!(url = %registration.url, error = %e, "Failed to sign profile");
                None
            }
        }
    }

    /// Signed note events for every dated item of a resolved feed, in feed
    /// order. Undated items are skipped.
    pub fn note_events(&self, resolved: &ResolvedFeed) -> Vec<ReplayItem> {
        let ResolvedFeed { registration, feed } = resolved;
        let default_created_at = now();

        feed.items
            .iter()
            .filter(|item| item.created_at().is_some())
            .filter_map(|item| {
                let unsigned = self.synthesizer.note(
                    &registration.public_key,
                    item,
                    feed,
                    default_created_at,
                    &registration.url,
                );
                match unsigned.sign(&registration.private_key) {
                    Ok(event) => Some(ReplayItem::new(event, registration.private_key.as_str())),
                    Err(e) => {
                        warn!(url = %registration.url, link = %item.link, error = %e, "Failed to sign note");
                        None
                    }
                }
            })
            .collect()
    }
}
