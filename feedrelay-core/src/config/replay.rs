//! Replay configuration.

use std::time::Duration;

/// Settings for forwarding synthesized events to downstream relays.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Whether events are replayed at all.
    pub enabled: bool,
    /// Relays (`ws://` / `wss://`) that receive replayed events.
    pub relays: Vec<String>,
    /// Cooldown after a batch has been sent to every relay.
    pub wait_between_batches: Duration,
    /// Time box for the auth challenge, each auth attempt and each publish.
    pub wait_for_relay_response: Duration,
    /// Maximum number of events in one batch; older events are dropped.
    pub max_events: usize,
    /// Maximum number of outstanding replay tasks.
    pub max_subroutines: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            relays: Vec::new(),
            wait_between_batches: Duration::from_millis(60_000),
            wait_for_relay_response: Duration::from_millis(3_000),
            max_events: 20,
            max_subroutines: 20,
        }
    }
}
