//! Outbound relay client.
//!
//! Gated behind the `client` cargo feature so crates that only need the
//! protocol objects do not pull in the websocket stack.

mod relay;

pub use relay::{PublishStatus, RelayConnection};

/// Errors produced by the relay client.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Transport-level failure (DNS, TLS, handshake, connection reset, …).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The relay did not complete the handshake in time.
    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),

    /// The relay URL is not a websocket URL.
    #[error("invalid relay url: {0}")]
    InvalidUrl(String),
}
