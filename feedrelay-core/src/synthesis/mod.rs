//! Translation of parsed feeds into unsigned protocol events.
//!
//! A feed yields one profile (kind 0) event and one note (kind 1) event per
//! item. Both are pure functions of the feed, the configuration and the
//! original feed URL, so re-synthesizing unchanged content yields identical
//! events once signed.

mod note;
mod profile;
mod quirks;

pub use note::{MAX_CONTENT_CHARS, note_content, strip_html, truncate_content};
pub use profile::profile_content;
pub use quirks::{ContentTransform, NoteParts, ProfileParts, TwitterMirror};

use crate::config::ProfileConfig;
use crate::feed::{FeedItem, ParsedFeed};
use feedrelay_sdk::event::now;
use feedrelay_sdk::{KIND_METADATA, KIND_TEXT_NOTE, Timestamp, UnsignedEvent};
use tracing::debug;

/// Builds profile and note events for feeds.
pub struct Synthesizer {
    profile: ProfileConfig,
    transforms: Vec<Box<dyn ContentTransform>>,
}

impl Synthesizer {
    /// Synthesizer with the built-in source transforms.
    pub fn new(profile: ProfileConfig) -> Self {
        Self::with_transforms(profile, vec![Box::new(TwitterMirror)])
    }

    pub fn with_transforms(profile: ProfileConfig, transforms: Vec<Box<dyn ContentTransform>>) -> Self {
        Self { profile, transforms }
    }

    fn transform_for(&self, feed: &ParsedFeed) -> Option<&dyn ContentTransform> {
        let transform = self.transforms.iter().find(|t| t.matches(feed))?;
        debug!(transform = transform.name(), feed = %feed.title, "Applying content transform");
        Some(transform.as_ref())
    }

    /// The metadata event of a feed, dated at the feed's publication time or
    /// now.
    pub fn profile(
        &self,
        public_key: &str,
        feed: &ParsedFeed,
        original_url: &str,
    ) -> Result<UnsignedEvent, serde_json::Error> {
        let content = profile_content(feed, &self.profile, self.transform_for(feed), original_url)?;
        Ok(UnsignedEvent {
            pubkey: public_key.to_string(),
            created_at: feed.published_at.unwrap_or_else(now),
            kind: KIND_METADATA,
            tags: Vec::new(),
            content,
        })
    }

    /// The note event of one item.
    ///
    /// `created_at` is the item's update time, else its publication time,
    /// else `default_created_at`. Callers must drop notes of undated items
    /// (see [`FeedItem::created_at`]).
    pub fn note(
        &self,
        public_key: &str,
        item: &FeedItem,
        feed: &ParsedFeed,
        default_created_at: Timestamp,
        original_url: &str,
    ) -> UnsignedEvent {
        UnsignedEvent {
            pubkey: public_key.to_string(),
            created_at: item.created_at().unwrap_or(default_created_at),
            kind: KIND_TEXT_NOTE,
            tags: Vec::new(),
            content: note_content(item, self.transform_for(feed), original_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedrelay_sdk::FeedIdentity;

    fn example_blog() -> ParsedFeed {
        ParsedFeed {
            title: "Example Blog".into(),
            description: "Posts".into(),
            link: "https://e/".into(),
            published_at: Some(1_600_000_000),
            items: vec![FeedItem {
                title: "Hello".into(),
                description: "Hello".into(),
                link: "https://e/1".into(),
                published_at: Some(1_700_000_000),
                ..FeedItem::default()
            }],
            ..ParsedFeed::default()
        }
    }

    #[test]
    fn test_example_blog_note() {
        let feed = example_blog();
        let synthesizer = Synthesizer::new(ProfileConfig::default());
        let note = synthesizer.note("pk", &feed.items[0], &feed, 42, "https://e/rss");
        assert_eq!(note.content, "\n\nhttps://e/1");
        assert_eq!(note.created_at, 1_700_000_000);
        assert_eq!(note.kind, KIND_TEXT_NOTE);
        assert!(note.tags.is_empty());
    }

    #[test]
    fn test_undated_profile_is_dated_now() {
        let mut feed = example_blog();
        feed.published_at = None;
        let synthesizer = Synthesizer::new(ProfileConfig::default());

        let before = now();
        let profile = synthesizer.profile("pk", &feed, "https://e/rss").unwrap();
        let after = now();
        assert_eq!(profile.kind, KIND_METADATA);
        assert!(profile.created_at >= before && profile.created_at <= after);
    }

    #[test]
    fn test_undated_note_falls_back_to_default() {
        let mut feed = example_blog();
        feed.items[0].published_at = None;
        let synthesizer = Synthesizer::new(ProfileConfig::default());
        let note = synthesizer.note("pk", &feed.items[0], &feed, 42, "https://e/rss");
        assert_eq!(note.created_at, 42);
    }

    #[test]
    fn test_profile_uses_feed_publication_time() {
        let feed = example_blog();
        let synthesizer = Synthesizer::new(ProfileConfig::default());
        let profile = synthesizer.profile("pk", &feed, "https://e/rss").unwrap();
        assert_eq!(profile.kind, KIND_METADATA);
        assert_eq!(profile.created_at, 1_600_000_000);
    }

    #[test]
    fn test_signed_events_are_deterministic_and_verify() {
        let identity = FeedIdentity::derive("https://e/rss", "secret").unwrap();
        let feed = example_blog();
        let synthesizer = Synthesizer::new(ProfileConfig::default());

        let sign = || {
            synthesizer
                .note(&identity.public_key, &feed.items[0], &feed, 0, &identity.url)
                .sign(&identity.private_key)
                .unwrap()
        };
        let first = sign();
        let second = sign();
        assert_eq!(first, second);
        assert_eq!(first.compute_id().unwrap(), first.id);
        first.verify().unwrap();
    }

    #[test]
    fn test_custom_transforms_replace_builtins() {
        struct Shout;
        impl ContentTransform for Shout {
            fn name(&self) -> &'static str {
                "shout"
            }
            fn matches(&self, _feed: &ParsedFeed) -> bool {
                true
            }
            fn transform_profile(&self, profile: &mut ProfileParts, _original_url: &str) {
                profile.title = profile.title.to_uppercase();
            }
            fn transform_note(&self, note: &mut NoteParts, _item: &FeedItem, _original_url: &str) {
                note.content = note.description.to_uppercase();
            }
        }

        let mut feed = example_blog();
        feed.items[0].description = "quiet".into();
        let synthesizer = Synthesizer::with_transforms(ProfileConfig::default(), vec![Box::new(Shout)]);
        let note = synthesizer.note("pk", &feed.items[0], &feed, 0, "");
        assert_eq!(note.content, "QUIET\n\nhttps://e/1");
    }
}
