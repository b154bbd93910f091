//! Per-feed identity derivation.
//!
//! Every feed gets a signing key computed as
//! `hex(HMAC-SHA256(key = secret, message = feed_url))`. The derivation is
//! deterministic, so a feed keeps its identity for as long as the process
//! secret stays the same. Rotating the secret gives every registered feed a
//! new identity; the old public keys stop resolving.

use secp256k1::{Keypair, SECP256K1, SecretKey};

/// Errors produced while handling key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(#[from] secp256k1::Error),
}

/// Derive the hex-encoded private key for a feed URL.
pub fn derive_private_key(url: &str, secret: &str) -> String {
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret.as_bytes());
    let tag = ring::hmac::sign(&key, url.as_bytes());
    hex::encode(tag.as_ref())
}

/// Parse a hex-encoded secp256k1 secret key.
pub fn parse_secret_key(secret_key_hex: &str) -> Result<SecretKey, KeyError> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(secret_key_hex, &mut bytes)?;
    Ok(SecretKey::from_slice(&bytes)?)
}

/// Compute the hex-encoded x-only public key for a hex-encoded secret key.
pub fn public_key_from_private(secret_key_hex: &str) -> Result<String, KeyError> {
    let secret_key = parse_secret_key(secret_key_hex)?;
    let (xonly, _parity) = Keypair::from_secret_key(SECP256K1, &secret_key).x_only_public_key();
    Ok(xonly.to_string())
}

/// A feed's derived keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedIdentity {
    pub url: String,
    pub public_key: String,
    pub private_key: String,
}

impl FeedIdentity {
    /// Derive the identity of `url` under `secret`.
    pub fn derive(url: &str, secret: &str) -> Result<Self, KeyError> {
        let private_key = derive_private_key(url, secret);
        let public_key = public_key_from_private(&private_key)?;
        Ok(Self {
            url: url.to_string(),
            public_key,
            private_key,
        })
    }
}
