//! Background poller configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Sleep between two polling cycles.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20 * 60),
        }
    }
}
