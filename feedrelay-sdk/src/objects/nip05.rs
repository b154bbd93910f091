//! NIP-05 well-known document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query of `GET /.well-known/nostr.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Nip05Query {
    pub name: Option<String>,
}

/// Body of `/.well-known/nostr.json`: local names mapped to hex public keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nip05Response {
    pub names: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relays: Option<BTreeMap<String, Vec<String>>>,
}

impl Nip05Response {
    pub fn single(name: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            names: BTreeMap::from([(name.into(), public_key.into())]),
            relays: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_name_document() {
        let doc = Nip05Response::single("_", "abcd");
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"names":{"_":"abcd"}}"#
        );
    }
}
