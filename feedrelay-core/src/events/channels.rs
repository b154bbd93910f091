//! Channel factories and handles.

use feedrelay_sdk::Event;
use tokio::sync::mpsc;

/// Buffer of the live-update channel.
///
/// A single slot makes every send a handoff: the poller waits whenever the
/// transport has not yet taken the previous event.
pub const LIVE_EVENT_BUFFER: usize = 1;

/// Sender handle for events pushed to live subscribers.
pub type LiveEventSender = mpsc::Sender<Event>;
/// Receiver handle for events pushed to live subscribers.
pub type LiveEventReceiver = mpsc::Receiver<Event>;

/// Create the live-update channel between the poller and the transport.
pub fn live_event_channel() -> (LiveEventSender, LiveEventReceiver) {
    mpsc::channel(LIVE_EVENT_BUFFER)
}
