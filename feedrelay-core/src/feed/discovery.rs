//! Locate the feed behind a user-supplied URL.

use super::cache::FetchError;
use super::join::url_join;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};

/// Content types recognized as feeds, in lookup order.
pub const FEED_CONTENT_TYPES: [&str; 5] = [
    "rss+xml",
    "atom+xml",
    "feed+json",
    "text/xml",
    "application/xml",
];

/// Resolve `url` to a feed URL.
///
/// A response served with a feed content type is the feed itself. An HTML
/// page is searched for `<link type="...">` elements advertising a feed,
/// trying each content type in order; relative hrefs are joined onto `url`.
pub async fn discover_feed_url(http_client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = http_client.get(url).send().await?;
    let status = response.status();
    if status.as_u16() >= 300 {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if FEED_CONTENT_TYPES.iter().any(|t| content_type.contains(t)) {
        return Ok(url.to_string());
    }

    if content_type.contains("text/html") {
        let body = response.text().await?;
        if let Some(href) = find_feed_link(&body) {
            if href.starts_with("http") {
                return Ok(href);
            }
            return url_join(url, &[href.as_str()]).map_err(|_| FetchError::NoFeed(url.to_string()));
        }
    }

    Err(FetchError::NoFeed(url.to_string()))
}

/// First feed `<link>` href found in an HTML document.
pub fn find_feed_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    FEED_CONTENT_TYPES.iter().find_map(|content_type| {
        let selector = Selector::parse(&format!("link[type*='{content_type}']")).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("href"))
            .filter(|href| !href.is_empty())
            .map(str::to_string)
    })
}
