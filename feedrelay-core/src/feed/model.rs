//! Cache-resident feed model.
//!
//! Only the fields used for synthesis survive conversion from the parser's
//! model. Item bodies are never kept; an item's description is its summary.

use feed_rs::model::{Entry, Feed, Link, Text};
use feedrelay_sdk::Timestamp;

/// A parsed feed, rebuilt on every cache miss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: String,
    pub description: String,
    /// Link to the site the feed belongs to.
    pub link: String,
    pub image_url: Option<String>,
    pub published_at: Option<Timestamp>,
    pub items: Vec<FeedItem>,
}

/// One entry of a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    /// HTML description.
    pub description: String,
    pub link: String,
    pub published_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub creator_names: Vec<String>,
}

impl FeedItem {
    /// Timestamp of the item, preferring the update time.
    ///
    /// `None` for items that carry neither date; those cannot be ordered and
    /// are never emitted.
    pub fn created_at(&self) -> Option<Timestamp> {
        self.updated_at.or(self.published_at)
    }
}

fn text(value: Option<Text>) -> String {
    value.map(|t| t.content).unwrap_or_default()
}

fn timestamp(seconds: Option<i64>) -> Option<Timestamp> {
    seconds.and_then(|s| Timestamp::try_from(s).ok())
}

/// Pick the human-facing link: `alternate` or unqualified before anything
/// else, never `self` unless it is the only one.
fn primary_link(links: &[Link]) -> String {
    links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|link| link.href.clone())
        .unwrap_or_default()
}

impl From<Entry> for FeedItem {
    fn from(entry: Entry) -> Self {
        Self {
            title: text(entry.title),
            description: text(entry.summary),
            link: primary_link(&entry.links),
            published_at: timestamp(entry.published.map(|dt| dt.timestamp())),
            updated_at: timestamp(entry.updated.map(|dt| dt.timestamp())),
            creator_names: entry.authors.into_iter().map(|p| p.name).collect(),
        }
    }
}

impl From<Feed> for ParsedFeed {
    fn from(feed: Feed) -> Self {
        let image_url = feed
            .logo
            .or(feed.icon)
            .map(|image| image.uri)
            .filter(|uri| !uri.is_empty());
        Self {
            title: text(feed.title),
            description: text(feed.description),
            link: primary_link(&feed.links),
            image_url,
            published_at: timestamp(feed.published.map(|dt| dt.timestamp())),
            items: feed.entries.into_iter().map(FeedItem::from).collect(),
        }
    }
}

/// Parse a feed document (RSS, Atom or JSON Feed).
pub fn parse_feed(body: &[u8]) -> Result<ParsedFeed, feed_rs::parser::ParseFeedError> {
    Ok(feed_rs::parser::parse(body)?.into())
}
