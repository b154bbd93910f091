//! Event payloads passed between processors.

use feedrelay_sdk::Event;

/// A signed event paired with the key of the feed that signed it.
///
/// The replayer answers relay auth challenges per event, so every event
/// carries its own identity.
#[derive(Debug, Clone)]
pub struct ReplayItem {
    pub event: Event,
    pub private_key: String,
}

impl ReplayItem {
    pub fn new(event: Event, private_key: impl Into<String>) -> Self {
        Self {
            event,
            private_key: private_key.into(),
        }
    }
}
