//! Signed protocol events.
//!
//! An event id is the lowercase hex SHA-256 of the canonical serialization
//! `[0, pubkey, created_at, kind, tags, content]`. The signature is a
//! BIP-340 Schnorr signature over the id bytes.
//!
//! Signing is performed without auxiliary randomness, so the same unsigned
//! event signed with the same key always produces the same [`Event`]. Feed
//! items are re-synthesized on every query, and consumers rely on identical
//! content producing identical ids and signatures.

use crate::keys::{KeyError, parse_secret_key};
use secp256k1::{Keypair, Message, SECP256K1, XOnlyPublicKey, schnorr};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Profile metadata (NIP-01).
pub const KIND_METADATA: u16 = 0;
/// Short text note (NIP-01).
pub const KIND_TEXT_NOTE: u16 = 1;
/// Client authentication (NIP-42).
pub const KIND_CLIENT_AUTH: u16 = 22242;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Current unix time in seconds.
pub fn now() -> Timestamp {
    u64::try_from(time::OffsetDateTime::now_utc().unix_timestamp()).unwrap_or_default()
}

/// Errors produced while hashing, signing or verifying events.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid key: {0}")]
    Key(#[from] KeyError),
    #[error("signing key does not belong to event author {0}")]
    AuthorMismatch(String),
    #[error("event id does not match its content")]
    IdMismatch,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// An event before it is hashed and signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    pub pubkey: String,
    pub created_at: Timestamp,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

/// A hashed and signed event, as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    pub created_at: Timestamp,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

fn canonical_json(
    pubkey: &str,
    created_at: Timestamp,
    kind: u16,
    tags: &[Vec<String>],
    content: &str,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&(0, pubkey, created_at, kind, tags, content))
}

fn digest(serialized: &str) -> [u8; 32] {
    let hash = ring::digest::digest(&ring::digest::SHA256, serialized.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_ref());
    out
}

impl UnsignedEvent {
    /// Canonical serialization used for hashing.
    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        canonical_json(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    /// Compute the event id (hex SHA-256 of the canonical serialization).
    pub fn id(&self) -> Result<String, EventError> {
        Ok(hex::encode(digest(&self.serialize()?)))
    }

    /// Hash and sign the event with a hex-encoded secret key.
    ///
    /// The key must belong to `self.pubkey`.
    pub fn sign(self, secret_key_hex: &str) -> Result<Event, EventError> {
        let secret_key = parse_secret_key(secret_key_hex)?;
        let keypair = Keypair::from_secret_key(SECP256K1, &secret_key);
        let (xonly, _parity) = keypair.x_only_public_key();
        if xonly.to_string() != self.pubkey {
            return Err(EventError::AuthorMismatch(self.pubkey));
        }

        let id_bytes = digest(&self.serialize()?);
        let message = Message::from_digest(id_bytes);
        let sig = SECP256K1.sign_schnorr_no_aux_rand(&message, &keypair);

        Ok(Event {
            id: hex::encode(id_bytes),
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: sig.to_string(),
        })
    }
}

impl Event {
    /// Recompute the id from the event's fields.
    pub fn compute_id(&self) -> Result<String, EventError> {
        let serialized = canonical_json(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )?;
        Ok(hex::encode(digest(&serialized)))
    }

    /// Check that the id matches the content and the signature is valid for
    /// the author's public key.
    pub fn verify(&self) -> Result<(), EventError> {
        let id = self.compute_id()?;
        if id != self.id {
            return Err(EventError::IdMismatch);
        }

        let pubkey = XOnlyPublicKey::from_str(&self.pubkey)
            .map_err(|e| EventError::InvalidPublicKey(e.to_string()))?;
        let sig = schnorr::Signature::from_str(&self.sig).map_err(|_| EventError::InvalidSignature)?;
        let mut id_bytes = [0u8; 32];
        hex::decode_to_slice(&self.id, &mut id_bytes).map_err(|_| EventError::IdMismatch)?;

        SECP256K1
            .verify_schnorr(&sig, &Message::from_digest(id_bytes), &pubkey)
            .map_err(|_| EventError::InvalidSignature)
    }

    /// Look up the first value of a single-letter tag (e.g. `"relay"`).
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.first().map(String::as_str) == Some(name))
            .and_then(|tag| tag.get(1))
            .map(String::as_str)
    }
}
