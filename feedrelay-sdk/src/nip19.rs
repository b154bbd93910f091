//! Bech32 encoding of public keys (NIP-19 `npub`).

use bech32::{Bech32, Hrp};

const NPUB_HRP: Hrp = Hrp::parse_unchecked("npub");

/// Errors produced while encoding or decoding `npub` strings.
#[derive(Debug, thiserror::Error)]
pub enum Nip19Error {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("bech32 encode error: {0}")]
    Encode(#[from] bech32::EncodeError),
    #[error("bech32 decode error: {0}")]
    Decode(#[from] bech32::DecodeError),
    #[error("not an npub")]
    WrongPrefix,
}

/// Encode a hex public key as `npub1...`.
pub fn encode_public_key(public_key_hex: &str) -> Result<String, Nip19Error> {
    let bytes = hex::decode(public_key_hex)?;
    Ok(bech32::encode::<Bech32>(NPUB_HRP, &bytes)?)
}

/// Decode an `npub1...` string back to a hex public key.
pub fn decode_public_key(npub: &str) -> Result<String, Nip19Error> {
    let (hrp, bytes) = bech32::decode(npub)?;
    if hrp != NPUB_HRP {
        return Err(Nip19Error::WrongPrefix);
    }
    Ok(hex::encode(bytes))
}
