//! A single websocket connection to a relay.
//!
//! A background reader task routes incoming frames: `AUTH` challenges go to
//! a channel drained by [`RelayConnection::wait_for_challenge`], and `OK`
//! acknowledgements resolve the pending publish or auth attempt with the
//! same event id.

use super::RelayError;
use crate::event::Event;
use crate::message::{ClientMessage, RelayMessage};
use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingAcks = Arc<Mutex<HashMap<String, oneshot::Sender<bool>>>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of sending an `EVENT` or `AUTH` message.
///
/// The discriminants are distinct bits so that the outcomes of a batch can
/// be OR-ed into a single summary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PublishStatus {
    /// Written to the socket, but the relay did not acknowledge it in time.
    Sent = 0b001,
    /// The relay answered `OK true`.
    Succeeded = 0b010,
    /// The relay answered `OK false`, or the message could not be written.
    Failed = 0b100,
}

impl PublishStatus {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Whether the event may be considered delivered.
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Sent | Self::Succeeded)
    }
}

impl std::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Succeeded => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// An open connection to a single relay.
pub struct RelayConnection {
    url: String,
    writer: SplitSink<WsStream, Message>,
    challenges: mpsc::UnboundedReceiver<String>,
    pending: PendingAcks,
    reader: JoinHandle<()>,
}

impl RelayConnection {
    /// Open a websocket connection to `url` (`ws://` or `wss://`).
    pub async fn connect(url: &str) -> Result<Self, RelayError> {
        let parsed = url::Url::parse(url).map_err(|_| RelayError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(RelayError::InvalidUrl(url.to_string()));
        }

        let (stream, _response) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(url))
            .await
            .map_err(|_| RelayError::ConnectTimeout(url.to_string()))??;
        let (writer, mut reader) = stream.split();

        let (challenge_tx, challenges) = mpsc::unbounded_channel();
        let pending: PendingAcks = Arc::new(Mutex::new(HashMap::new()));
        let reader_pending = pending.clone();
        let relay_url = url.to_string();

        let reader = tokio::spawn(async move {
            while let Some(frame) = reader.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(relay = %relay_url, error = %e, "Relay read failed");
                        break;
                    }
                };

                match RelayMessage::from_json(&text) {
                    Ok(RelayMessage::Auth(challenge)) => {
                        let _ = challenge_tx.send(challenge);
                    }
                    Ok(RelayMessage::Ok {
                        event_id,
                        accepted,
                        message,
                    }) => {
                        if !accepted {
                            debug!(relay = %relay_url, %event_id, %message, "Relay rejected event");
                        }
                        if let Some(ack) = reader_pending.lock().await.remove(&event_id) {
                            let _ = ack.send(accepted);
                        }
                    }
                    Ok(RelayMessage::Notice(notice)) => {
                        debug!(relay = %relay_url, %notice, "Relay notice");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(relay = %relay_url, error = %e, "Unparseable relay message");
                    }
                }
            }
        });

        Ok(Self {
            url: url.to_string(),
            writer,
            challenges,
            pending,
            reader,
        })
    }

    /// Wait up to `wait` for the relay to push an authentication challenge.
    ///
    /// Returns `None` when no challenge arrives in time, meaning the relay
    /// does not require authentication.
    pub async fn wait_for_challenge(&mut self, wait: Duration) -> Option<String> {
        tokio::time::timeout(wait, self.challenges.recv())
            .await
            .ok()
            .flatten()
    }

    /// Send a signed `AUTH` event and wait up to `wait` for its `OK`.
    pub async fn auth(&mut self, event: &Event, wait: Duration) -> PublishStatus {
        self.send_and_confirm(ClientMessage::Auth(Box::new(event.clone())), &event.id, wait)
            .await
    }

    /// Publish an event and wait up to `wait` for its `OK`.
    pub async fn publish(&mut self, event: &Event, wait: Duration) -> PublishStatus {
        self.send_and_confirm(ClientMessage::Event(Box::new(event.clone())), &event.id, wait)
            .await
    }

    async fn send_and_confirm(
        &mut self,
        message: ClientMessage,
        event_id: &str,
        wait: Duration,
    ) -> PublishStatus {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.pending.lock().await.insert(event_id.to_string(), ack_tx);

        if let Err(e) = self.writer.send(Message::Text(message.to_json())).await {
            warn!(relay = %self.url, error = %e, "Failed to write to relay");
            self.pending.lock().await.remove(event_id);
            return PublishStatus::Failed;
        }

        match tokio::time::timeout(wait, ack_rx).await {
            Ok(Ok(true)) => PublishStatus::Succeeded,
            Ok(Ok(false)) => PublishStatus::Failed,
            // Reader exited before an acknowledgement arrived.
            Ok(Err(_)) => PublishStatus::Failed,
            Err(_) => {
                self.pending.lock().await.remove(event_id);
                PublishStatus::Sent
            }
        }
    }

    /// Close the connection and stop the reader task.
    pub async fn close(mut self) {
        let _ = self.writer.send(Message::Close(None)).await;
        let _ = self.writer.close().await;
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KIND_TEXT_NOTE, UnsignedEvent};
    use crate::keys::FeedIdentity;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Spawn a relay that optionally sends a challenge and answers every
    /// EVENT/AUTH with `OK <accept>`.
    async fn spawn_relay(challenge: Option<&'static str>, accept: Option<bool>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            if let Some(challenge) = challenge {
                ws.send(Message::Text(RelayMessage::Auth(challenge.into()).to_json()))
                    .await
                    .unwrap();
            }
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let event = match ClientMessage::from_json(&text) {
                    Ok(ClientMessage::Event(event)) | Ok(ClientMessage::Auth(event)) => event,
                    _ => continue,
                };
                if let Some(accepted) = accept {
                    let ok = RelayMessage::Ok {
                        event_id: event.id.clone(),
                        accepted,
                        message: String::new(),
                    };
                    ws.send(Message::Text(ok.to_json())).await.unwrap();
                }
            }
        });
        format!("ws://{addr}")
    }

    fn signed_note() -> Event {
        let identity = FeedIdentity::derive("https://example.com/feed", "secret").unwrap();
        UnsignedEvent {
            pubkey: identity.public_key,
            created_at: 1_700_000_000,
            kind: KIND_TEXT_NOTE,
            tags: vec![],
            content: "hello".into(),
        }
        .sign(&identity.private_key)
        .unwrap()
    }

    #[tokio::test]
    async fn test_publish_succeeds_and_challenge_is_received() {
        let url = spawn_relay(Some("abc"), Some(true)).await;
        let mut relay = RelayConnection::connect(&url).await.unwrap();

        let challenge = relay.wait_for_challenge(Duration::from_secs(2)).await;
        assert_eq!(challenge.as_deref(), Some("abc"));

        let status = relay.publish(&signed_note(), Duration::from_secs(2)).await;
        assert_eq!(status, PublishStatus::Succeeded);
        relay.close().await;
    }

    #[tokio::test]
    async fn test_rejected_publish_fails() {
        let url = spawn_relay(None, Some(false)).await;
        let mut relay = RelayConnection::connect(&url).await.unwrap();
        let status = relay.publish(&signed_note(), Duration::from_secs(2)).await;
        assert_eq!(status, PublishStatus::Failed);
        assert!(!status.is_delivered());
    }

    #[tokio::test]
    async fn test_silent_relay_yields_sent_and_no_challenge() {
        let url = spawn_relay(None, None).await;
        let mut relay = RelayConnection::connect(&url).await.unwrap();
        assert_eq!(
            relay.wait_for_challenge(Duration::from_millis(100)).await,
            None
        );
        let status = relay
            .publish(&signed_note(), Duration::from_millis(100))
            .await;
        assert_eq!(status, PublishStatus::Sent);
        assert!(status.is_delivered());
    }

    #[tokio::test]
    async fn test_rejects_non_websocket_url() {
        assert!(matches!(
            RelayConnection::connect("https://relay.example").await,
            Err(RelayError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_status_bits_are_distinct() {
        let summary = PublishStatus::Sent.bits() | PublishStatus::Failed.bits();
        assert_eq!(summary, 0b101);
        assert_eq!(summary & PublishStatus::Succeeded.bits(), 0);
    }
}
