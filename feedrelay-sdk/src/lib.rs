//! Protocol objects shared by the feedrelay crates.
//!
//! - [`event`]: event model, canonical hashing, deterministic signing
//! - [`filter`]: subscription filters
//! - [`message`]: client/relay wire messages
//! - [`keys`]: per-feed key derivation
//! - [`nip42`]: relay authentication events
//! - [`nip19`]: `npub` encoding
//! - [`objects`]: HTTP API bodies
//!
//! The `client` feature adds an outbound relay connection used to publish
//! events to downstream relays.

#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod event;
pub mod filter;
pub mod keys;
pub mod message;
pub mod nip19;
pub mod nip42;
pub mod objects;

pub use event::{Event, EventError, KIND_CLIENT_AUTH, KIND_METADATA, KIND_TEXT_NOTE, Timestamp, UnsignedEvent};
pub use filter::Filter;
pub use keys::{FeedIdentity, KeyError};
