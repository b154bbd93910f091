//! Note content assembly.

use super::quirks::{ContentTransform, NoteParts};
use crate::feed::FeedItem;
use scraper::Html;

/// Notes longer than this many characters get a truncated copy appended.
pub const MAX_CONTENT_CHARS: usize = 250;

/// Text content of an HTML fragment, entities decoded.
pub fn strip_html(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

/// Append the first 249 characters of `content` plus an ellipsis when the
/// content exceeds [`MAX_CONTENT_CHARS`].
///
/// The full content is kept in front of the appended prefix, so long notes
/// show their opening twice.
pub fn truncate_content(content: &mut String) {
    if content.chars().count() > MAX_CONTENT_CHARS {
        let prefix: String = content.chars().take(MAX_CONTENT_CHARS - 1).collect();
        content.push_str(&prefix);
        content.push('…');
    }
}

/// Build the full note body for `item`, permalink included.
pub fn note_content(
    item: &FeedItem,
    transform: Option<&dyn ContentTransform>,
    original_url: &str,
) -> String {
    let description = strip_html(&item.description);

    let content = if item.title.to_lowercase() == description.to_lowercase() {
        String::new()
    } else if item.title.is_empty() {
        description.clone()
    } else {
        format!("**{}**\n\n{}", item.title, description)
    };

    let mut parts = NoteParts {
        content,
        description,
        link: item.link.clone(),
    };
    if let Some(transform) = transform {
        transform.transform_note(&mut parts, item, original_url);
    }

    let mut content = parts.content;
    truncate_content(&mut content);
    content.push_str("\n\n");
    content.push_str(&parts.link);
    content
}
