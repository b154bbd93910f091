//! One websocket client speaking NIP-01.
//!
//! `REQ` is answered from the query engine followed by `EOSE`, and the
//! subscription stays open for live notes from the poller. The relay is
//! read-only: every `EVENT` is refused.

use crate::relay::ConnectionId;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket};
use feedrelay_sdk::message::{ClientMessage, RelayMessage};
use feedrelay_sdk::{Event, Filter};
use std::collections::{HashMap, HashSet};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

pub const BLOCKED_EVENT_MESSAGE: &str = "blocked: we don't accept any events";

/// Subscriptions opened on one connection.
#[derive(Debug, Default)]
pub struct Session {
    connection: ConnectionId,
    open: HashMap<String, Vec<Filter>>,
}

impl Session {
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            open: HashMap::new(),
        }
    }

    /// Replies to one client frame, in order.
    pub async fn respond(&mut self, state: &AppState, text: &str) -> Vec<RelayMessage> {
        let message = match ClientMessage::from_json(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(connection = self.connection, error = %e, "Unparseable client message");
                return vec![RelayMessage::Notice(format!("could not parse message: {e}"))];
            }
        };

        match message {
            ClientMessage::Req {
                subscription_id,
                filters,
            } => {
                let mut replies = Vec::new();
                let mut seen = HashSet::new();
                for filter in &filters {
                    for event in state.query.evaluate(filter).await {
                        if seen.insert(event.id.clone()) {
                            replies.push(RelayMessage::Event {
                                subscription_id: subscription_id.clone(),
                                event: Box::new(event),
                            });
                        }
                    }
                }
                replies.push(RelayMessage::Eose(subscription_id.clone()));

                state
                    .subscriptions
                    .register(self.connection, &subscription_id, filters.clone());
                self.open.insert(subscription_id, filters);
                replies
            }
            ClientMessage::Close(subscription_id) => {
                state
                    .subscriptions
                    .unregister(self.connection, &subscription_id);
                self.open.remove(&subscription_id);
                Vec::new()
            }
            ClientMessage::Event(event) => vec![RelayMessage::Ok {
                event_id: event.id,
                accepted: false,
                message: BLOCKED_EVENT_MESSAGE.to_string(),
            }],
            ClientMessage::Auth(_) => {
                vec![RelayMessage::Notice("authentication is not required here".to_string())]
            }
        }
    }

    /// `EVENT` messages delivering a live note to every matching subscription.
    pub fn live(&self, event: &Event) -> Vec<RelayMessage> {
        self.open
            .iter()
            .filter(|(_, filters)| filters.iter().any(|filter| filter.matches(event)))
            .map(|(subscription_id, _)| RelayMessage::Event {
                subscription_id: subscription_id.clone(),
                event: Box::new(event.clone()),
            })
            .collect()
    }
}

/// Drive a websocket connection until the client leaves.
pub async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let connection = state.subscriptions.connect();
    let mut live_rx = state.live_events.subscribe();
    let mut session = Session::new(connection);
    debug!(connection, "Client connected");

    loop {
        let replies = tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => session.respond(&state, text.as_str()).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(connection, error = %e, "Websocket error");
                        break;
                    }
                }
            }

            live = live_rx.recv() => {
                match live {
                    Ok(event) => session.live(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(connection, skipped, "Session lagged behind live events");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        };

        if send_all(&mut socket, &replies).await.is_err() {
            break;
        }
    }

    state.subscriptions.disconnect(connection);
    debug!(connection, "Client disconnected");
}

/// Send relay messages as text frames.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_all(socket: &mut WebSocket, replies: &[RelayMessage]) -> Result<(), ()> {
    for reply in replies {
        socket
            .send(Message::Text(reply.to_json().into()))
            .await
            .map_err(|_| ())?;
    }
    Ok(())
}
