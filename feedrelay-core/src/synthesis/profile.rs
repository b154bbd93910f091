//! Profile metadata content.

use super::quirks::{ContentTransform, ProfileParts};
use crate::config::ProfileConfig;
use crate::feed::ParsedFeed;
use std::collections::BTreeMap;

/// Serialized metadata for a feed's profile event.
///
/// Keys: `name`, `about` (description and site link), `picture` (feed image
/// or the configured fallback, omitted when both are empty) and, with
/// automatic registration enabled, a `nip05` handle.
pub fn profile_content(
    feed: &ParsedFeed,
    config: &ProfileConfig,
    transform: Option<&dyn ContentTransform>,
    original_url: &str,
) -> Result<String, serde_json::Error> {
    let mut parts = ProfileParts {
        title: feed.title.clone(),
        description: feed.description.clone(),
        link: feed.link.clone(),
        image_url: feed.image_url.clone(),
    };
    if let Some(transform) = transform {
        transform.transform_profile(&mut parts, original_url);
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("name", parts.title);
    metadata.insert("about", format!("{}\n\n{}", parts.description, parts.link));

    if config.enable_auto_nip05 {
        metadata.insert("nip05", format!("{}@{}", parts.link, config.nip05_domain));
    }

    match parts.image_url {
        Some(image_url) => {
            metadata.insert("picture", image_url);
        }
        None if !config.default_picture_url.is_empty() => {
            metadata.insert("picture", config.default_picture_url.clone());
        }
        None => {}
    }

    serde_json::to_string(&metadata)
}
