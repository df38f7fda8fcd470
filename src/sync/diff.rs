//! Unified diff of one project's definition on two gateways.

use serde_json::{Map, Value};
use similar::TextDiff;

const CONTEXT_LINES: usize = 3;

/// Pretty JSON with object keys sorted at every depth.
///
/// Gateways return keys in their own order; sorting first keeps the diff
/// down to real value changes.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let sorted = sort_keys(value);
    // Serializing a `Value` cannot fail.
    serde_json::to_string_pretty(&sorted).unwrap_or_default()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), sort_keys(inner)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Unified diff of `source` against `target`, or `None` when they match.
///
/// Headers read `<name> (source)` and `<name> (target)`.
#[must_use]
pub fn project_diff(name: &str, source: &Value, target: &Value) -> Option<String> {
    let source_text = format!("{}\n", canonical_json(source));
    let target_text = format!("{}\n", canonical_json(target));
    if source_text == target_text {
        return None;
    }

    let diff = TextDiff::from_lines(&source_text, &target_text);
    Some(
        diff.unified_diff()
            .context_radius(CONTEXT_LINES)
            .header(&format!("{name} (source)"), &format!("{name} (target)"))
            .to_string(),
    )
}
