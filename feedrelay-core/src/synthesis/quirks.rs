//! Source-specific content rewrites.
//!
//! Some aggregators publish feeds that need special handling before their
//! content reads well as notes. Each source is a [`ContentTransform`]; the
//! synthesizer applies the first one whose [`ContentTransform::matches`]
//! accepts the feed.

use crate::feed::{FeedItem, ParsedFeed};

/// Profile fields a transform may rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileParts {
    pub title: String,
    pub description: String,
    pub link: String,
    pub image_url: Option<String>,
}

/// Note fields a transform may rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteParts {
    /// Note body, before truncation and without the permalink.
    pub content: String,
    /// HTML-stripped item description.
    pub description: String,
    /// Permalink appended after the body.
    pub link: String,
}

pub trait ContentTransform: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn matches(&self, feed: &ParsedFeed) -> bool;

    fn transform_profile(&self, profile: &mut ProfileParts, original_url: &str);

    fn transform_note(&self, note: &mut NoteParts, item: &FeedItem, original_url: &str);
}

fn upgrade_scheme(value: &str) -> String {
    value.replace("http://", "https://")
}

/// Twitter mirrors (Nitter and friends).
///
/// Mirrors serve every link over `http://` even when the mirror itself is
/// reached over HTTPS, and repeat the tweet text in the title. Notes are
/// rebuilt from the description alone, with a short prefix for retweets and
/// replies.
pub struct TwitterMirror;

impl TwitterMirror {
    const MARKER: &'static str = "Twitter feed";
}

impl ContentTransform for TwitterMirror {
    fn name(&self) -> &'static str {
        "twitter-mirror"
    }

    fn matches(&self, feed: &ParsedFeed) -> bool {
        feed.description.contains(Self::MARKER)
    }

    fn transform_profile(&self, profile: &mut ProfileParts, original_url: &str) {
        if !original_url.starts_with("https://") {
            return;
        }
        profile.description = upgrade_scheme(&profile.description);
        profile.title = upgrade_scheme(&profile.title);
        profile.link = upgrade_scheme(&profile.link);
        if let Some(image_url) = profile.image_url.as_mut() {
            *image_url = upgrade_scheme(image_url);
        }
    }

    fn transform_note(&self, note: &mut NoteParts, item: &FeedItem, original_url: &str) {
        if original_url.starts_with("https://") {
            note.description = upgrade_scheme(&note.description);
        }

        let mut content = String::new();
        if item.title.contains("RT by @") {
            if let Some(creator) = item.creator_names.first() {
                content = format!("**RT {creator}:**\n\n");
            }
        } else if item.title.contains("R to @") {
            if let Some(handle) = item.title.split_whitespace().nth(2) {
                content = format!("**Response to {handle}:**\n\n");
            }
        }
        content.push_str(&note.description);

        note.content = content;
        note.link = upgrade_scheme(&note.link);
    }
}
