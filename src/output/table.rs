//! Plain-text tables and trees sized to the terminal.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::{cell, truncate_to_width};

const COLUMN_GAP: &str = "  ";
const MIN_COLUMN_WIDTH: usize = 4;

/// Renders a headed table. Columns shrink (widest first) until a line fits `width`.
#[must_use]
pub fn render_table(
    title: Option<&str>,
    columns: &[String],
    rows: &[Vec<String>],
    width: usize,
) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (index, value) in row.iter().enumerate().take(widths.len()) {
            widths[index] = widths[index].max(value.chars().count());
        }
    }
    fit_widths(&mut widths, width);

    let mut lines = Vec::with_capacity(rows.len() + 3);
    if let Some(title) = title {
        lines.push(truncate_to_width(title, width));
    }
    lines.push(format_row(columns, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP),
    );
    for row in rows {
        lines.push(format_row(row, &widths));
    }
    lines.join("\n")
}

/// Renders an object as a two-column key/value table without a header.
#[must_use]
pub fn render_kv_table(title: Option<&str>, map: &Map<String, Value>, width: usize) -> String {
    let key_width = map.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    let mut lines = Vec::with_capacity(map.len() + 1);
    if let Some(title) = title {
        lines.push(truncate_to_width(title, width));
    }
    for (key, value) in map {
        let line = format!("{key:<key_width$}{COLUMN_GAP}{}", cell(value));
        lines.push(truncate_to_width(line.trim_end(), width));
    }
    lines.join("\n")
}

fn fit_widths(widths: &mut [usize], max_total: usize) {
    let gaps = COLUMN_GAP.len() * widths.len().saturating_sub(1);
    loop {
        let total: usize = widths.iter().sum::<usize>() + gaps;
        if total <= max_total {
            return;
        }
        let Some(widest) = widths.iter_mut().filter(|w| **w > MIN_COLUMN_WIDTH).max_by_key(|w| **w)
        else {
            return;
        };
        *widest -= 1;
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let line = widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let value = cells.get(index).map_or("", String::as_str);
            let value = truncate_to_width(value, *width);
            format!("{value:<width$}")
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    line.trim_end().to_string()
}

/// One node of a rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Text shown for the node.
    pub label: String,
    /// Child nodes, in display order.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A node without children.
    #[must_use]
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Builds a forest from `/`-separated identifiers.
    ///
    /// Intermediate segments that are not themselves identifiers become
    /// folder nodes labelled with a trailing `/`. Children are sorted.
    #[must_use]
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Vec<Self> {
        let leaves: BTreeSet<&str> = paths.iter().map(AsRef::as_ref).collect();
        build_level(&leaves, "")
    }
}

fn build_level(leaves: &BTreeSet<&str>, prefix: &str) -> Vec<TreeNode> {
    let mut names = BTreeSet::new();
    for path in leaves {
        let Some(rest) = path.strip_prefix(prefix) else {
            continue;
        };
        if let Some(segment) = rest.split('/').next().filter(|s| !s.is_empty()) {
            names.insert(segment);
        }
    }

    names
        .into_iter()
        .map(|name| {
            let full = format!("{prefix}{name}");
            let children = build_level(leaves, &format!("{full}/"));
            let label = if leaves.contains(full.as_str()) {
                name.to_string()
            } else {
                format!("{name}/")
            };
            TreeNode { label, children }
        })
        .collect()
}

/// Draws a tree with box-drawing connectors under `root_label`.
#[must_use]
pub fn render_tree(root_label: &str, nodes: &[TreeNode]) -> String {
    let mut lines = vec![root_label.to_string()];
    draw_children(nodes, "", &mut lines);
    lines.join("\n")
}

fn draw_children(nodes: &[TreeNode], indent: &str, lines: &mut Vec<String>) {
    for (index, node) in nodes.iter().enumerate() {
        let last = index + 1 == nodes.len();
        let (connector, continuation) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        lines.push(format!("{indent}{connector}{}", node.label));
        draw_children(&node.children, &format!("{indent}{continuation}"), lines);
    }
}
