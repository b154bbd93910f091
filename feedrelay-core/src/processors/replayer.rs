//! Replayer processor.
//!
//! The Replayer is responsible for:
//! - Capping submitted batches to the most recent events
//! - Shedding batches once too many are outstanding
//! - Publishing each batch to every configured downstream relay,
//!   authenticating every event with its own feed identity when the relay
//!   asks for it
//!
//! Admission and execution are guarded separately. Up to
//! `max_subroutines` batches may be admitted, but only one batch publishes
//! at a time: a batch holds the execution lock across all relays and the
//! cooldown that follows them.

use crate::config::{ConfigStore, ReplayConfig};
use crate::events::ReplayItem;
use feedrelay_sdk::client::{PublishStatus, RelayConnection};
use feedrelay_sdk::nip42::create_unsigned_auth_event;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What happened to a submitted batch.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Nothing to replay.
    Empty,
    /// Replay is turned off.
    Disabled,
    /// Too many batches are outstanding; the batch was dropped.
    Shed,
    /// A task was spawned for the batch.
    Launched(JoinHandle<()>),
}

/// Keep the `max_events` most recent events of `batch`.
///
/// The sort is stable, so events with equal `created_at` keep their
/// submission order.
pub fn cap_batch(mut batch: Vec<ReplayItem>, max_events: usize) -> Vec<ReplayItem> {
    if batch.len() > max_events {
        batch.sort_by(|a, b| b.event.created_at.cmp(&a.event.created_at));
        batch.truncate(max_events);
    }
    batch
}

/// Forwards synthesized events to downstream relays.
pub struct Replayer {
    config: ConfigStore<ReplayConfig>,
    admission: Arc<Mutex<usize>>,
    execution: Arc<Mutex<()>>,
}

impl Replayer {
    pub fn new(config: ConfigStore<ReplayConfig>) -> Self {
        Self {
            config,
            admission: Arc::new(Mutex::new(0)),
            execution: Arc::new(Mutex::new(())),
        }
    }

    /// Number of admitted batches that have not finished their cooldown.
    pub async fn outstanding(&self) -> usize {
        *self.admission.lock().await
    }

    /// Submit a batch for replay.
    ///
    /// The configuration is read once per batch; a reload only affects later
    /// submissions.
    pub async fn submit(&self, batch: Vec<ReplayItem>) -> SubmitOutcome {
        if batch.is_empty() {
            return SubmitOutcome::Empty;
        }
        let config = self.config.snapshot().await;
        if !config.enabled {
            return SubmitOutcome::Disabled;
        }

        let batch = cap_batch(batch, config.max_events);
        {
            let mut outstanding = self.admission.lock().await;
            if *outstanding >= config.max_subroutines {
                debug!(
                    outstanding = *outstanding,
                    events = batch.len(),
                    "Replay queue full, dropping batch"
                );
                return SubmitOutcome::Shed;
            }
            *outstanding += 1;
        }

        let admission = self.admission.clone();
        let execution = self.execution.clone();
        SubmitOutcome::Launched(tokio::spawn(async move {
            let _guard = execution.lock().await;
            for relay_url in &config.relays {
                replay_to_relay(relay_url, &batch, config.wait_for_relay_response).await;
            }
            tokio::time::sleep(config.wait_between_batches).await;

            let mut outstanding = admission.lock().await;
            *outstanding = outstanding.saturating_sub(1);
        }))
    }
}

/// Publish a batch to a single relay. Failures never leave this function.
async fn replay_to_relay(url: &str, batch: &[ReplayItem], wait: Duration) {
    let mut relay = match RelayConnection::connect(url).await {
        Ok(relay) => relay,
        Err(e) => {
            warn!(relay = %url, error = %e, "Failed to connect to relay");
            return;
        }
    };

    let challenge = relay.wait_for_challenge(wait).await;
    match &challenge {
        Some(challenge) => debug!(relay = %url, %challenge, "Got challenge"),
        None => debug!(relay = %url, "No challenge received, skipping auth"),
    }

    let mut status_summary = 0u8;
    for item in batch {
        if let Some(challenge) = &challenge {
            if !authenticate(&mut relay, challenge, url, item, wait).await {
                continue;
            }
        }
        let status = relay.publish(&item.event, wait).await;
        status_summary |= status.bits();
    }

    info!(
        relay = %url,
        events = batch.len(),
        status_summary,
        "Replayed {} events to {} with status summary {}",
        batch.len(),
        url,
        status_summary
    );
    relay.close().await;
}

/// Answer `challenge` as the author of `item`.
async fn authenticate(
    relay: &mut RelayConnection,
    challenge: &str,
    url: &str,
    item: &ReplayItem,
    wait: Duration,
) -> bool {
    let pubkey = &item.event.pubkey;
    let auth = match create_unsigned_auth_event(challenge, pubkey, url).sign(&item.private_key) {
        Ok(auth) => auth,
        Err(e) => {
            warn!(relay = %url, %pubkey, error = %e, "Failed to sign auth event");
            return false;
        }
    };

    let status = relay.auth(&auth, wait).await;
    debug!(relay = %url, %pubkey, %status, "Authenticated");
    matches!(status, PublishStatus::Succeeded | PublishStatus::Sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedrelay_sdk::message::{ClientMessage, RelayMessage};
    use feedrelay_sdk::{Event, FeedIdentity, KIND_CLIENT_AUTH, KIND_TEXT_NOTE, UnsignedEvent};
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    fn item(url: &str, created_at: u64) -> ReplayItem {
        let identity = FeedIdentity::derive(url, "secret").unwrap();
        let event = UnsignedEvent {
            pubkey: identity.public_key,
            created_at,
            kind: KIND_TEXT_NOTE,
            tags: vec![],
            content: format!("note at {created_at}"),
        }
        .sign(&identity.private_key)
        .unwrap();
        ReplayItem::new(event, identity.private_key)
    }

    fn config(relays: Vec<String>) -> ReplayConfig {
        ReplayConfig {
            enabled: true,
            relays,
            wait_between_batches: Duration::from_millis(10),
            wait_for_relay_response: Duration::from_millis(500),
            max_events: 20,
            max_subroutines: 20,
        }
    }

    /// In-process relay. Sends `challenge` on connect, answers AUTH with
    /// `OK <accept_auth>` and EVENT with `OK true`, and reports every
    /// message it receives.
    async fn spawn_relay(
        challenge: Option<&'static str>,
        accept_auth: bool,
    ) -> (String, mpsc::UnboundedReceiver<ClientMessage>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let seen_tx = seen_tx.clone();
                tokio::spawn(async move {
                    let mut ws = accept_async(tcp).await.unwrap();
                    if let Some(challenge) = challenge {
                        ws.send(Message::Text(RelayMessage::Auth(challenge.into()).to_json()))
                            .await
                            .unwrap();
                    }
                    while let Some(Ok(Message::Text(text))) = ws.next().await {
                        let Ok(message) = ClientMessage::from_json(&text) else {
                            continue;
                        };
                        let reply = match &message {
                            ClientMessage::Auth(event) => Some((event.id.clone(), accept_auth)),
                            ClientMessage::Event(event) => Some((event.id.clone(), true)),
                            _ => None,
                        };
                        let _ = seen_tx.send(message);
                        if let Some((event_id, accepted)) = reply {
                            let ok = RelayMessage::Ok {
                                event_id,
                                accepted,
                                message: String::new(),
                            };
                            if ws.send(Message::Text(ok.to_json())).await.is_err() {
                                break;
                            }
                        }
                    }
                });
            }
        });
        (format!("ws://{addr}"), seen_rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ClientMessage>) -> Vec<ClientMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn published(messages: &[ClientMessage]) -> Vec<Event> {
        messages
            .iter()
            .filter_map(|m| match m {
                ClientMessage::Event(event) => Some(event.as_ref().clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_cap_keeps_most_recent() {
        let batch: Vec<_> = [5, 1, 9, 3, 7]
            .into_iter()
            .map(|t| item("https://a.example/rss", t))
            .collect();
        let capped = cap_batch(batch, 3);
        let times: Vec<_> = capped.iter().map(|i| i.event.created_at).collect();
        assert_eq!(times, [9, 7, 5]);
    }

    #[test]
    fn test_cap_leaves_small_batches_untouched() {
        let batch: Vec<_> = [1, 3, 2]
            .into_iter()
            .map(|t| item("https://a.example/rss", t))
            .collect();
        let times: Vec<_> = cap_batch(batch, 3)
            .iter()
            .map(|i| i.event.created_at)
            .collect();
        assert_eq!(times, [1, 3, 2]);
    }

    #[tokio::test]
    async fn test_empty_and_disabled() {
        let replayer = Replayer::new(ConfigStore::new(config(vec![])));
        assert!(matches!(replayer.submit(vec![]).await, SubmitOutcome::Empty));

        let disabled = Replayer::new(ConfigStore::new(ReplayConfig::default()));
        assert!(matches!(
            disabled.submit(vec![item("https://a.example/rss", 1)]).await,
            SubmitOutcome::Disabled
        ));
    }

    #[tokio::test]
    async fn test_full_queue_sheds_batches() {
        let mut cfg = config(vec![]);
        cfg.max_subroutines = 1;
        cfg.wait_between_batches = Duration::from_secs(30);
        let replayer = Replayer::new(ConfigStore::new(cfg));

        let SubmitOutcome::Launched(first) = replayer.submit(vec![item("https://a.example/rss", 1)]).await
        else {
            panic!("first batch should launch");
        };
        assert_eq!(replayer.outstanding().await, 1);

        assert!(matches!(
            replayer.submit(vec![item("https://a.example/rss", 2)]).await,
            SubmitOutcome::Shed
        ));
        assert_eq!(replayer.outstanding().await, 1);
        first.abort();
    }

    #[tokio::test]
    async fn test_zero_subroutines_never_launch() {
        let mut cfg = config(vec![]);
        cfg.max_subroutines = 0;
        let replayer = Replayer::new(ConfigStore::new(cfg));
        assert!(matches!(
            replayer.submit(vec![item("https://a.example/rss", 1)]).await,
            SubmitOutcome::Shed
        ));
        assert_eq!(replayer.outstanding().await, 0);
    }

    #[tokio::test]
    async fn test_replays_with_per_event_auth() {
        let (url, mut seen) = spawn_relay(Some("challenge-1"), true).await;
        let replayer = Replayer::new(ConfigStore::new(config(vec![url.clone()])));

        let batch = vec![
            item("https://a.example/rss", 10),
            item("https://b.example/rss", 20),
        ];
        let SubmitOutcome::Launched(handle) = replayer.submit(batch.clone()).await else {
            panic!("batch should launch");
        };
        handle.await.unwrap();
        assert_eq!(replayer.outstanding().await, 0);

        let messages = drain(&mut seen);
        let auths: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                ClientMessage::Auth(event) => Some(event.as_ref().clone()),
                _ => None,
            })
            .collect();
        assert_eq!(auths.len(), 2);
        for (auth, replayed) in auths.iter().zip(&batch) {
            auth.verify().unwrap();
            assert_eq!(auth.kind, KIND_CLIENT_AUTH);
            assert_eq!(auth.pubkey, replayed.event.pubkey);
            assert_eq!(auth.tag_value("challenge"), Some("challenge-1"));
            assert_eq!(auth.tag_value("relay"), Some(url.as_str()));
        }

        let events = published(&messages);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], batch[0].event);
        assert_eq!(events[1], batch[1].event);
    }

    #[tokio::test]
    async fn test_rejected_auth_skips_event() {
        let (url, mut seen) = spawn_relay(Some("challenge-2"), false).await;
        let replayer = Replayer::new(ConfigStore::new(config(vec![url])));

        let SubmitOutcome::Launched(handle) =
            replayer.submit(vec![item("https://a.example/rss", 10)]).await
        else {
            panic!("batch should launch");
        };
        handle.await.unwrap();

        let messages = drain(&mut seen);
        assert!(messages.iter().any(|m| matches!(m, ClientMessage::Auth(_))));
        assert!(published(&messages).is_empty());
    }

    #[tokio::test]
    async fn test_batches_publish_one_at_a_time() {
        let (url, mut seen) = spawn_relay(None, true).await;
        let mut cfg = config(vec![url]);
        cfg.wait_for_relay_response = Duration::from_millis(100);
        cfg.wait_between_batches = Duration::from_millis(400);
        let replayer = Replayer::new(ConfigStore::new(cfg));

        let SubmitOutcome::Launched(first) =
            replayer.submit(vec![item("https://a.example/rss", 10)]).await
        else {
            panic!("first batch should launch");
        };
        let SubmitOutcome::Launched(second) =
            replayer.submit(vec![item("https://b.example/rss", 20)]).await
        else {
            panic!("second batch should launch");
        };
        assert_eq!(replayer.outstanding().await, 2);

        let mut arrivals = Vec::new();
        while arrivals.len() < 2 {
            if let ClientMessage::Event(event) = seen.recv().await.unwrap() {
                arrivals.push((event.created_at, tokio::time::Instant::now()));
            }
        }
        first.await.unwrap();
        second.await.unwrap();

        let (first_created, first_at) = arrivals[0];
        let (second_created, second_at) = arrivals[1];
        assert_ne!(first_created, second_created);
        assert!(second_at - first_at >= Duration::from_millis(400));
        assert_eq!(replayer.outstanding().await, 0);
    }

    #[tokio::test]
    async fn test_unreachable_relay_does_not_stop_others() {
        let (url, mut seen) = spawn_relay(None, true).await;
        let mut cfg = config(vec!["ws://127.0.0.1:1".to_string(), url]);
        cfg.wait_for_relay_response = Duration::from_millis(100);
        let replayer = Replayer::new(ConfigStore::new(cfg));

        let SubmitOutcome::Launched(handle) =
            replayer.submit(vec![item("https://a.example/rss", 10)]).await
        else {
            panic!("batch should launch");
        };
        handle.await.unwrap();

        let messages = drain(&mut seen);
        assert!(!messages.iter().any(|m| matches!(m, ClientMessage::Auth(_))));
        assert_eq!(published(&messages).len(), 1);
    }
}
