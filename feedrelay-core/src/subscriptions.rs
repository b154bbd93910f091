//! Boundary to the transport layer's live subscriptions.

use feedrelay_sdk::Filter;

/// Source of the filters of every currently open subscription.
pub trait ListeningFilters: Send + Sync {
    fn listening_filters(&self) -> Vec<Filter>;
}

impl ListeningFilters for Vec<Filter> {
    fn listening_filters(&self) -> Vec<Filter> {
        self.clone()
    }
}
