//! Background processors.
//!
//! - `FeedPoller`: on a timer, emits new notes on the live-update channel
//!   and submits them for replay
//! - `Replayer`: publishes submitted batches to downstream relays

pub mod poller;
pub mod replayer;

pub use poller::FeedPoller;
pub use replayer::{Replayer, SubmitOutcome, cap_batch};
