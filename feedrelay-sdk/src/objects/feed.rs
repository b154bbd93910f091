use serde::{Deserialize, Serialize};

use crate::nip19::{Nip19Error, encode_public_key};

/// Query of `GET /api/feed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterFeedQuery {
    /// A feed URL, or a web page advertising one.
    pub url: Option<String>,
}

/// A registered feed as returned by the registration and search endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Hex public key derived for the feed.
    pub pubkey: String,
    /// The same key as `npub1...`.
    pub npub: String,
    /// The resolved feed URL.
    pub url: String,
}

impl FeedEntry {
    pub fn new(pubkey: impl Into<String>, url: impl Into<String>) -> Result<Self, Nip19Error> {
        let pubkey = pubkey.into();
        let npub = encode_public_key(&pubkey)?;
        Ok(Self {
            pubkey,
            npub,
            url: url.into(),
        })
    }
}

/// Query of `GET /api/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFeedsQuery {
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFeedsResponse {
    /// Number of registered feeds.
    pub count: u64,
    /// Number of entries in `entries`.
    pub filtered_count: u64,
    pub entries: Vec<FeedEntry>,
}
