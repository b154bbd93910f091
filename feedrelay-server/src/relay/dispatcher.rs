//! LiveDispatcher processor.
//!
//! Drains the poller's live-update channel and broadcasts every note to the
//! connected sessions. Each session decides which of its subscriptions the
//! note matches.

use feedrelay_core::events::LiveEventReceiver;
use feedrelay_sdk::Event;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

/// Capacity of the fan-out channel; slower sessions skip what they miss.
pub const LIVE_BROADCAST_CAPACITY: usize = 256;

pub struct LiveDispatcher {
    live_rx: LiveEventReceiver,
    broadcast_tx: broadcast::Sender<Arc<Event>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LiveDispatcher {
    pub fn new(
        live_rx: LiveEventReceiver,
        broadcast_tx: broadcast::Sender<Arc<Event>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            live_rx,
            broadcast_tx,
            shutdown_rx,
        }
    }

    /// Run the LiveDispatcher until shutdown or until the poller is gone.
    pub async fn run(mut self) {
        info!("LiveDispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("LiveDispatcher received shutdown signal");
                        break;
                    }
                }

                event = self.live_rx.recv() => {
                    let Some(event) = event else {
                        info!("Live-update channel closed");
                        break;
                    };
                    // No receivers just means nobody is connected.
                    if self.broadcast_tx.send(Arc::new(event)).is_err() {
                        debug!("No connected sessions for live event");
                    }
                }
            }
        }

        info!("LiveDispatcher shutdown complete");
    }
}
