//! Per-feed emission watermark.
//!
//! Records, per feed URL, the `created_at` of the newest note already handed
//! out. Values only move forward. The map lives for the lifetime of the
//! process; after a restart every feed starts without a watermark.

use dashmap::DashMap;
use feedrelay_sdk::Timestamp;

#[derive(Debug, Default)]
pub struct EmissionWatermark {
    marks: DashMap<String, Timestamp>,
}

impl EmissionWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Timestamp> {
        self.marks.get(url).map(|mark| *mark)
    }

    /// Raise the watermark of `url` to `created_at` if it is newer.
    ///
    /// Returns the watermark after the update.
    pub fn advance(&self, url: &str, created_at: Timestamp) -> Timestamp {
        let mut mark = self.marks.entry(url.to_string()).or_insert(created_at);
        if created_at > *mark {
            *mark = created_at;
        }
        *mark
    }

    /// Whether a note created at `created_at` is newer than anything emitted
    /// for `url` so far.
    pub fn should_emit(&self, url: &str, created_at: Timestamp) -> bool {
        self.get(url).is_none_or(|mark| created_at > mark)
    }
}
