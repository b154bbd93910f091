//! Feed fetching, parsing and discovery.

mod cache;
mod discovery;
mod join;
mod model;

pub use cache::{FeedCache, FetchError};
pub use discovery::{FEED_CONTENT_TYPES, discover_feed_url, find_feed_link};
pub use join::url_join;
pub use model::{FeedItem, ParsedFeed, parse_feed};
