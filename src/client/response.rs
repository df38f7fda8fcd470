//! Normalization of list-shaped gateway responses.
//!
//! List endpoints answer either with a bare JSON array or with an envelope
//! object whose items sit under `items` (or an endpoint-specific key such as
//! `projects`, `resources`, `logs`). [`ListResponse`] classifies a response
//! once so downstream code only ever sees an ordered `Vec<Value>`.

use serde_json::{Map, Value};

/// Pagination metadata carried by an envelope response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    /// Total number of items across all pages, when the gateway reports it.
    pub total: Option<u64>,
    /// Raw metadata object.
    pub raw: Map<String, Value>,
}

impl PageMetadata {
    fn from_value(value: Option<&Value>) -> Option<Self> {
        let Some(Value::Object(raw)) = value else {
            return None;
        };
        let total = raw.get("total").and_then(Value::as_u64);
        Some(Self {
            total,
            raw: raw.clone(),
        })
    }
}

/// A list response classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ListResponse {
    /// The body was a JSON array.
    Bare(Vec<Value>),
    /// The body was an object with an item array under a known key.
    Envelope {
        /// The items, in gateway order.
        items: Vec<Value>,
        /// Pagination metadata (`metadata` key), if any.
        metadata: Option<PageMetadata>,
    },
    /// No item array could be located.
    Unrecognized,
}

impl ListResponse {
    /// Classifies `value`, trying `items` first and then each fallback key in order.
    #[must_use]
    pub fn from_value(value: Value, fallback_keys: &[&str]) -> Self {
        match value {
            Value::Array(items) => Self::Bare(items),
            Value::Object(mut map) => {
                let metadata = PageMetadata::from_value(map.get("metadata"));
                let key = std::iter::once("items")
                    .chain(fallback_keys.iter().copied())
                    .find(|key| map.contains_key(*key));
                match key.and_then(|key| map.remove(key)) {
                    Some(Value::Array(items)) => Self::Envelope { items, metadata },
                    _ => Self::Unrecognized,
                }
            }
            _ => Self::Unrecognized,
        }
    }

    /// Pagination metadata; `None` for bare lists, unrecognized shapes and
    /// envelopes without a `metadata` object.
    #[must_use]
    pub fn metadata(&self) -> Option<&PageMetadata> {
        match self {
            Self::Envelope { metadata, .. } => metadata.as_ref(),
            _ => None,
        }
    }

    /// Whether the gateway paged this response. Only envelopes carrying
    /// `metadata` honor `limit`/`offset`.
    #[must_use]
    pub fn is_paginated(&self) -> bool {
        self.metadata().is_some()
    }

    /// Consumes the response, yielding its items (empty when unrecognized).
    #[must_use]
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Bare(items) | Self::Envelope { items, .. } => items,
            Self::Unrecognized => Vec::new(),
        }
    }
}

/// Shorthand for `ListResponse::from_value(value.clone(), keys).into_items()`.
#[must_use]
pub fn extract_items(value: &Value, fallback_keys: &[&str]) -> Vec<Value> {
    ListResponse::from_value(value.clone(), fallback_keys).into_items()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_is_bare() {
        let response = ListResponse::from_value(json!([{"name": "a"}, {"name": "b"}]), &[]);
        assert!(matches!(response, ListResponse::Bare(ref items) if items.len() == 2));
        assert!(response.metadata().is_none());
    }

    #[test]
    fn test_items_key_preferred_over_fallback() {
        let response = ListResponse::from_value(
            json!({"items": [1], "projects": [1, 2], "metadata": {"total": 7}}),
            &["projects"],
        );
        assert_eq!(response.metadata().and_then(|m| m.total), Some(7));
        assert_eq!(response.into_items(), vec![json!(1)]);
    }

    #[test]
    fn test_fallback_keys_tried_in_order() {
        let value = json!({"logs": ["x"], "entries": ["y", "z"]});
        assert_eq!(extract_items(&value, &["entries", "logs"]), vec![json!("y"), json!("z")]);
        assert_eq!(extract_items(&value, &["logs", "entries"]), vec![json!("x")]);
    }

    #[test]
    fn test_envelope_without_metadata_is_not_paginated() {
        let response = ListResponse::from_value(json!({"loggers": [{"name": "a"}]}), &["loggers"]);
        assert!(response.metadata().is_none());
        assert!(!response.is_paginated());

        let paged = ListResponse::from_value(json!({"items": [], "metadata": {}}), &[]);
        assert!(paged.is_paginated());
        assert_eq!(paged.metadata().and_then(|m| m.total), None);
    }

    #[test]
    fn test_unrecognized_shapes_yield_empty() {
        assert_eq!(
            ListResponse::from_value(json!({"name": "gw"}), &["projects"]),
            ListResponse::Unrecognized
        );
        assert!(extract_items(&json!("text"), &[]).is_empty());
        assert!(extract_items(&json!({"items": "not-a-list"}), &[]).is_empty());
    }
}
