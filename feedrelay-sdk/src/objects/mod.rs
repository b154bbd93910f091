//! Request and response bodies of the feedrelay HTTP API.

pub mod feed;
pub mod nip05;
pub mod relay_info;

pub use feed::{FeedEntry, RegisterFeedQuery, SearchFeedsQuery, SearchFeedsResponse};
pub use nip05::{Nip05Query, Nip05Response};
pub use relay_info::RelayInformation;
