//! Output rendering: table, JSON, YAML and CSV.
//!
//! Commands hand a `serde_json::Value` plus an optional [`TableSpec`]
//! projection to [`render`]; the chosen [`OutputFormat`] decides which of the
//! two is used. Everything here returns a `String` so the binary decides
//! where it goes (always stdout; logs go to stderr).

mod table;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use table::{TreeNode, render_kv_table, render_table, render_tree};

/// Supported output formats.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width text table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// YAML document.
    Yaml,
    /// Comma-separated values.
    Csv,
}

impl OutputFormat {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while rendering output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// JSON serialization failed.
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// YAML serialization failed.
    #[error("failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// CSV writing failed.
    #[error("failed to render CSV: {0}")]
    Csv(#[from] csv::Error),
    /// CSV writer produced non-UTF-8 output.
    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Tabular projection of a value, used by `table` and `csv`.
#[derive(Debug, Clone, Default)]
pub struct TableSpec {
    /// Optional title line above the table.
    pub title: Option<String>,
    /// Column headers. Empty means "no projection".
    pub columns: Vec<String>,
    /// Row cells, already stringified.
    pub rows: Option<Vec<Vec<String>>>,
    /// Render objects as a two-column key/value table.
    pub kv: bool,
}

impl TableSpec {
    /// An empty projection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A projection with the given columns and rows.
    #[must_use]
    pub fn rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Some(rows),
            ..Self::default()
        }
    }

    /// A key/value projection for a single object.
    #[must_use]
    pub fn kv() -> Self {
        Self {
            kv: true,
            ..Self::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn has_projection(&self) -> bool {
        !self.columns.is_empty() && self.rows.is_some()
    }
}

/// Renders `data` in `format`, using `spec` for tabular formats.
///
/// `csv` without a projection falls back to JSON.
///
/// # Errors
///
/// [`OutputError`] when serialization fails.
pub fn render(data: &Value, format: OutputFormat, spec: &TableSpec) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => render_json(data),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?.trim_end().to_string()),
        OutputFormat::Csv => match (&spec.rows, spec.has_projection()) {
            (Some(rows), true) => render_csv(&spec.columns, rows),
            _ => render_json(data),
        },
        OutputFormat::Table => Ok(render_table_value(data, spec, terminal_width())),
    }
}

/// Pretty JSON with 2-space indent.
///
/// # Errors
///
/// [`OutputError::Json`] when serialization fails.
pub fn render_json(data: &Value) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(data)?)
}

fn render_csv(columns: &[String], rows: &[Vec<String>]) -> Result<String, OutputError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(&mut buffer);
        writer.write_record(columns)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(csv::Error::from)?;
    }
    Ok(String::from_utf8(buffer)?.trim_end().to_string())
}

fn render_table_value(data: &Value, spec: &TableSpec, width: usize) -> String {
    let title = spec.title.as_deref();
    match (data, &spec.rows) {
        (Value::Object(map), _) if spec.kv => render_kv_table(title, map, width),
        (_, Some(rows)) if !spec.columns.is_empty() => {
            render_table(title, &spec.columns, rows, width)
        }
        (Value::Object(map), _) => render_kv_table(title, map, width),
        (Value::String(text), _) => text.clone(),
        (other, _) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Stringifies a JSON value for a table cell: strings bare, `null` empty.
#[must_use]
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Stringifies `value[key]`, empty when absent.
#[must_use]
pub fn field(value: &Value, key: &str) -> String {
    value.get(key).map(cell).unwrap_or_default()
}

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
#[must_use]
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
#[must_use]
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    match width {
        0 => String::new(),
        1 => "…".to_string(),
        _ => {
            let mut output: String = text.chars().take(width - 1).collect();
            output.push('…');
            output
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("abc", 1), "…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_json_preserves_key_order_and_indent() {
        let data = json!({"zeta": 1, "alpha": {"b": 2, "a": 1}});
        let rendered = render(&data, OutputFormat::Json, &TableSpec::new()).unwrap();
        assert_eq!(
            rendered,
            "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"b\": 2,\n    \"a\": 1\n  }\n}"
        );
    }

    #[test]
    fn test_yaml_output() {
        let rendered = render(&json!({"name": "gw", "port": 8088}), OutputFormat::Yaml, &TableSpec::new()).unwrap();
        assert_eq!(rendered, "name: gw\nport: 8088");
    }

    #[test]
    fn test_csv_with_projection() {
        let spec = TableSpec::rows(
            ["Name", "Title"],
            vec![
                vec!["a".to_string(), "Alpha, Inc".to_string()],
                vec!["b".to_string(), String::new()],
            ],
        );
        let rendered = render(&Value::Null, OutputFormat::Csv, &spec).unwrap();
        assert_eq!(rendered, "Name,Title\na,\"Alpha, Inc\"\nb,");
    }

    #[test]
    fn test_csv_without_columns_falls_back_to_json() {
        let data = json!({"name": "gw"});
        let rendered = render(&data, OutputFormat::Csv, &TableSpec::kv()).unwrap();
        assert_eq!(rendered, render_json(&data).unwrap());
    }

    #[test]
    fn test_table_for_plain_object_uses_kv_layout() {
        let rendered = render_table_value(&json!({"name": "gw", "version": "8.1"}), &TableSpec::new(), 80);
        assert_eq!(rendered, "name     gw\nversion  8.1");
    }

    #[test]
    fn test_table_for_string_prints_bare() {
        let rendered = render_table_value(&json!("RUNNING"), &TableSpec::new(), 80);
        assert_eq!(rendered, "RUNNING");
    }

    #[test]
    fn test_cell_stringification() {
        assert_eq!(cell(&Value::Null), "");
        assert_eq!(cell(&json!("x")), "x");
        assert_eq!(cell(&json!(true)), "true");
        assert_eq!(cell(&json!(3)), "3");
        assert_eq!(field(&json!({"a": 1}), "b"), "");
    }

    #[test]
    fn test_format_labels_round_trip_through_serde() {
        let parsed: OutputFormat = serde_json::from_str("\"yaml\"").unwrap();
        assert_eq!(parsed, OutputFormat::Yaml);
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }
}
