//! Builds and inspects project archives the way the gateway ships them.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use serde_json::{Value, json};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const NAMESPACE: &str = "com.inductiveautomation.perspective";

/// Zip bytes holding `entries` in the given order.
pub fn build<N: AsRef<str>>(entries: &[(N, String)]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut cursor);
        for (name, content) in entries {
            writer
                .start_file(name.as_ref(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// Entry names in the order they are stored, which `file_names` does not promise.
pub fn stored_order(bytes: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|index| archive.by_index(index).unwrap().name().to_string())
        .collect()
}

/// Every entry name mapped to its raw bytes.
pub fn contents(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|index| {
            let mut file = archive.by_index(index).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

/// One entry parsed as JSON, `None` when absent.
pub fn read_json(bytes: &[u8], name: &str) -> Option<Value> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    Some(serde_json::from_str(&text).unwrap())
}

pub fn view_path(id: &str) -> String {
    format!("{NAMESPACE}/views/{id}/view.json")
}

pub fn view_meta_path(id: &str) -> String {
    format!("{NAMESPACE}/views/{id}/resource.json")
}

/// `resource.json` as a designer-saved view carries it.
pub fn meta(actor: &str, timestamp: &str) -> String {
    json!({
        "scope": "G",
        "version": 1,
        "restricted": false,
        "overridable": true,
        "files": ["view.json", "thumbnail.png"],
        "attributes": {
            "lastModification": {"actor": actor, "timestamp": timestamp},
            "lastModificationSignature": "deadbeef"
        }
    })
    .to_string()
}

/// A small project: two views (one nested), a style class and a page config.
pub fn sample_project() -> Vec<u8> {
    build(&[
        (
            "project.json".to_string(),
            json!({"title": "Plant", "enabled": true}).to_string(),
        ),
        (
            view_path("Main/Home"),
            json!({"root": {"type": "ia.container.flex"}}).to_string(),
        ),
        (view_meta_path("Main/Home"), meta("admin", "2024-01-01T00:00:00Z")),
        (
            format!("{NAMESPACE}/views/Main/Home/thumbnail.png"),
            "png".to_string(),
        ),
        (
            view_path("Alarms"),
            json!({"root": {"type": "ia.container.coord"}}).to_string(),
        ),
        (view_meta_path("Alarms"), meta("admin", "2024-01-01T00:00:00Z")),
        (
            format!("{NAMESPACE}/style-classes/Buttons/Primary/style.json"),
            json!({"base": {"style": {"color": "#fff"}}}).to_string(),
        ),
        (
            format!("{NAMESPACE}/page-config/config.json"),
            json!({"pages": {"/": {"viewPath": "Main/Home"}, "/alarms": {"viewPath": "Alarms"}}})
                .to_string(),
        ),
    ])
}
