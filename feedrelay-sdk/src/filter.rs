//! Subscription filters (NIP-01).

use crate::event::{Event, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A subscription filter as sent in a `REQ` message.
///
/// Tag constraints are flattened into the JSON object with a `#` prefix
/// (`{"#e": [...], "#p": [...]}`). Unknown keys that are not tag
/// constraints (`"search"`, extension fields) are dropped on parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFilter")]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u16>>,

    /// Inclusive lower bound on `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<Timestamp>,

    /// Inclusive upper bound on `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(flatten)]
    pub tags: HashMap<String, Vec<String>>,
}

/// Wire shape of a filter before unknown keys are sorted out.
#[derive(Deserialize)]
struct RawFilter {
    #[serde(default)]
    ids: Option<Vec<String>>,
    #[serde(default)]
    authors: Option<Vec<String>>,
    #[serde(default)]
    kinds: Option<Vec<u16>>,
    #[serde(default)]
    since: Option<Timestamp>,
    #[serde(default)]
    until: Option<Timestamp>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl From<RawFilter> for Filter {
    fn from(raw: RawFilter) -> Self {
        let tags = raw
            .extra
            .into_iter()
            .filter(|(key, _)| key.starts_with('#'))
            .filter_map(|(key, value)| tag_values(value).map(|values| (key, values)))
            .collect();
        Self {
            ids: raw.ids,
            authors: raw.authors,
            kinds: raw.kinds,
            since: raw.since,
            until: raw.until,
            limit: raw.limit,
            tags,
        }
    }
}

/// Values of a tag constraint, when `value` is an array of strings.
fn tag_values(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn authors(mut self, authors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = u16>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn since(mut self, timestamp: Timestamp) -> Self {
        self.since = Some(timestamp);
        self
    }

    pub fn until(mut self, timestamp: Timestamp) -> Self {
        self.until = Some(timestamp);
        self
    }

    /// Add a tag constraint; the `#` prefix is added when missing.
    pub fn tag(mut self, name: &str, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let key = if name.starts_with('#') {
            name.to_string()
        } else {
            format!("#{name}")
        };
        self.tags
            .insert(key, values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the filter asks for `kind`. An absent kind list asks for every kind.
    pub fn wants_kind(&self, kind: u16) -> bool {
        self.kinds.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }

    /// Whether `created_at` lies inside the since/until window.
    pub fn in_time_range(&self, created_at: Timestamp) -> bool {
        if self.since.is_some_and(|since| created_at < since) {
            return false;
        }
        if self.until.is_some_and(|until| created_at > until) {
            return false;
        }
        true
    }

    /// Whether the filter constrains dimensions that are not indexed by a
    /// synthesizing store: explicit ids or any tag.
    pub fn has_id_or_tag_constraints(&self) -> bool {
        self.ids.is_some() || !self.tags.is_empty()
    }

    /// Check whether an event matches every constraint of this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| event.id.starts_with(id.as_str())) {
                return false;
            }
        }

        if let Some(authors) = &self.authors {
            if !authors
                .iter()
                .any(|author| event.pubkey.starts_with(author.trim()))
            {
                return false;
            }
        }

        if !self.wants_kind(event.kind) || !self.in_time_range(event.created_at) {
            return false;
        }

        self.tags.iter().all(|(key, values)| {
            let name = key.trim_start_matches('#');
            event.tags.iter().any(|tag| {
                tag.first().map(String::as_str) == Some(name)
                    && tag.get(1).is_some_and(|value| values.contains(value))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KIND_TEXT_NOTE;

    fn event(created_at: Timestamp, tags: Vec<Vec<String>>) -> Event {
        Event {
            id: "abcdef".to_string(),
            pubkey: "f00d".to_string(),
            created_at,
            kind: KIND_TEXT_NOTE,
            tags,
            content: String::new(),
            sig: String::new(),
        }
    }

    #[test]
    fn test_deserialize_with_tags() {
        let filter: Filter = serde_json::from_str(
            r##"{"authors":["f00d"],"kinds":[1],"since":10,"#e":["abc"],"limit":5}"##,
        )
        .unwrap();
        assert_eq!(filter.authors, Some(vec!["f00d".to_string()]));
        assert_eq!(filter.kinds, Some(vec![1]));
        assert_eq!(filter.since, Some(10));
        assert_eq!(filter.limit, Some(5));
        assert_eq!(filter.tags.get("#e"), Some(&vec!["abc".to_string()]));
        assert!(filter.has_id_or_tag_constraints());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let filter: Filter =
            serde_json::from_str(r#"{"authors":["f00d"],"foo":["bar"],"search":"rust"}"#).unwrap();
        assert_eq!(filter.authors, Some(vec!["f00d".to_string()]));
        assert!(filter.tags.is_empty());
        assert!(!filter.has_id_or_tag_constraints());
        assert!(filter.matches(&event(5, vec![])));
    }

    #[test]
    fn test_malformed_tag_values_are_dropped() {
        let filter: Filter =
            serde_json::from_str(r##"{"#e":"abc","#p":[1,2],"#t":["rust"]}"##).unwrap();
        assert_eq!(filter.tags.len(), 1);
        assert_eq!(filter.tags.get("#t"), Some(&vec!["rust".to_string()]));
    }

    #[test]
    fn test_serialize_keeps_tags_flat() {
        let json = serde_json::to_value(Filter::new().kinds([1]).tag("e", ["abc"])).unwrap();
        assert_eq!(json, serde_json::json!({"kinds": [1], "#e": ["abc"]}));
        let back: Filter = serde_json::from_value(json).unwrap();
        assert_eq!(back, Filter::new().kinds([1]).tag("e", ["abc"]));
    }

    #[test]
    fn test_empty_ids_still_counts_as_constraint() {
        let filter: Filter = serde_json::from_str(r#"{"ids":[]}"#).unwrap();
        assert!(filter.has_id_or_tag_constraints());
        assert!(!Filter::new().authors(["f00d"]).has_id_or_tag_constraints());
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let filter = Filter::new().since(10).until(20);
        assert!(filter.in_time_range(10));
        assert!(filter.in_time_range(20));
        assert!(!filter.in_time_range(9));
        assert!(!filter.in_time_range(21));
    }

    #[test]
    fn test_matches() {
        let filter = Filter::new().authors(["f00d"]).kinds([KIND_TEXT_NOTE]);
        assert!(filter.matches(&event(5, vec![])));
        assert!(!Filter::new().authors(["beef"]).matches(&event(5, vec![])));
        assert!(!Filter::new().kinds([0]).matches(&event(5, vec![])));
        assert!(Filter::new().ids(["abc"]).matches(&event(5, vec![])));

        let tagged = event(5, vec![vec!["p".to_string(), "xyz".to_string()]]);
        assert!(Filter::new().tag("p", ["xyz"]).matches(&tagged));
        assert!(!Filter::new().tag("#p", ["other"]).matches(&tagged));
    }

    #[test]
    fn test_absent_kinds_wants_everything() {
        assert!(Filter::new().wants_kind(0));
        assert!(Filter::new().wants_kind(1));
        assert!(!Filter::new().kinds([1]).wants_kind(0));
    }
}
