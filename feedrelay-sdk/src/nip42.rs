//! Client authentication to relays (NIP-42).

use crate::event::{KIND_CLIENT_AUTH, UnsignedEvent, now};

/// Build the unsigned authentication event answering `challenge` on
/// `relay_url` for the identity `pubkey`.
pub fn create_unsigned_auth_event(challenge: &str, pubkey: &str, relay_url: &str) -> UnsignedEvent {
    UnsignedEvent {
        pubkey: pubkey.to_string(),
        created_at: now(),
        kind: KIND_CLIENT_AUTH,
        tags: vec![
            vec!["relay".to_string(), relay_url.to_string()],
            vec!["challenge".to_string(), challenge.to_string()],
        ],
        content: String::new(),
    }
}
