//! Event plumbing between processors.
//!
//! # Event Flow
//!
//! 1. `FeedPoller` pushes new notes on the live-update channel -> transport
//! 2. `QueryEngine` and `FeedPoller` submit `ReplayItem` batches -> `Replayer`

pub mod channels;
pub mod types;

pub use channels::{LIVE_EVENT_BUFFER, LiveEventReceiver, LiveEventSender, live_event_channel};
pub use types::ReplayItem;
