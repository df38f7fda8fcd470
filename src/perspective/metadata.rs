//! `resource.json`: per-resource metadata and its audit stamp.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Actor recorded for changes made through this tool.
pub const EXTERNAL_ACTOR: &str = "external";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Contents of a resource's `resource.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    /// Scope flag (`G`ateway, `C`lient, `D`esigner combinations).
    pub scope: String,
    /// Format version.
    pub version: u32,
    /// Restricted resources cannot be edited in the designer.
    pub restricted: bool,
    /// Child projects may override this resource.
    pub overridable: bool,
    /// Payload files that belong to the resource.
    pub files: Vec<String>,
    /// Audit attributes.
    pub attributes: ResourceAttributes,
}

/// `attributes` block of [`ResourceMeta`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAttributes {
    /// Who changed the resource last, and when.
    pub last_modification: LastModification,
    /// Signature of the last modification; empty for external edits.
    pub last_modification_signature: String,
}

/// Last-modification audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastModification {
    /// Actor identifier.
    pub actor: String,
    /// UTC timestamp, whole seconds, ISO-8601.
    pub timestamp: String,
}

impl ResourceMeta {
    /// Metadata for a newly created resource owning `files`.
    #[must_use]
    pub fn new(files: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            scope: "G".to_string(),
            version: 1,
            restricted: false,
            overridable: true,
            files,
            attributes: ResourceAttributes {
                last_modification: LastModification {
                    actor: EXTERNAL_ACTOR.to_string(),
                    timestamp: audit_timestamp(now),
                },
                last_modification_signature: String::new(),
            },
        }
    }
}

/// Formats `now` as `YYYY-MM-DDTHH:MM:SSZ`.
#[must_use]
pub fn audit_timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Sets `attributes.lastModification.{actor,timestamp}` in an existing
/// metadata document, creating the intermediate objects when missing.
///
/// Every other key, and key order, is left as it was.
///
/// # Errors
///
/// A `serde_json::Error` when the document or one of its intermediate
/// values is not a JSON object.
pub fn refresh_audit(meta: &mut Value, now: DateTime<Utc>) -> Result<(), serde_json::Error> {
    let root = as_object(meta, "resource metadata")?;
    let attributes = as_object(
        root.entry("attributes").or_insert_with(|| Value::Object(Map::new())),
        "attributes",
    )?;
    let modification = as_object(
        attributes
            .entry("lastModification")
            .or_insert_with(|| Value::Object(Map::new())),
        "attributes.lastModification",
    )?;
    modification.insert("actor".to_string(), Value::from(EXTERNAL_ACTOR));
    modification.insert("timestamp".to_string(), Value::from(audit_timestamp(now)));
    Ok(())
}

fn as_object<'a>(
    value: &'a mut Value,
    what: &str,
) -> Result<&'a mut Map<String, Value>, serde_json::Error> {
    value
        .as_object_mut()
        .ok_or_else(|| serde_json::Error::custom(format!("{what} is not a JSON object")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_new_metadata_serializes_expected_shape() {
        let meta = ResourceMeta::new(vec!["view.json".to_string()], at(1_700_000_000));
        assert_eq!(
            serde_json::to_value(&meta).unwrap(),
            json!({
                "scope": "G",
                "version": 1,
                "restricted": false,
                "overridable": true,
                "files": ["view.json"],
                "attributes": {
                    "lastModification": {
                        "actor": "external",
                        "timestamp": "2023-11-14T22:13:20Z"
                    },
                    "lastModificationSignature": ""
                }
            })
        );
    }

    #[test]
    fn test_refresh_audit_touches_only_actor_and_timestamp() {
        let mut meta = json!({
            "scope": "A",
            "version": 2,
            "files": ["view.json", "thumbnail.png"],
            "attributes": {
                "lastModification": {"actor": "admin", "timestamp": "2020-01-01T00:00:00Z"},
                "lastModificationSignature": "abc123",
                "uuid": "keep-me"
            }
        });
        refresh_audit(&mut meta, at(1_700_000_000)).unwrap();

        assert_eq!(meta["scope"], "A");
        assert_eq!(meta["version"], 2);
        assert_eq!(meta["files"], json!(["view.json", "thumbnail.png"]));
        assert_eq!(meta["attributes"]["lastModificationSignature"], "abc123");
        assert_eq!(meta["attributes"]["uuid"], "keep-me");
        assert_eq!(meta["attributes"]["lastModification"]["actor"], "external");
        assert_eq!(
            meta["attributes"]["lastModification"]["timestamp"],
            "2023-11-14T22:13:20Z"
        );
        let keys: Vec<_> = meta.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["scope", "version", "files", "attributes"]);
    }

    #[test]
    fn test_refresh_audit_creates_missing_blocks() {
        let mut meta = json!({"scope": "G"});
        refresh_audit(&mut meta, at(0)).unwrap();
        assert_eq!(
            meta["attributes"]["lastModification"]["timestamp"],
            "1970-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_refresh_audit_rejects_non_object() {
        let mut meta = json!(["not", "an", "object"]);
        assert!(refresh_audit(&mut meta, at(0)).is_err());
    }
}
