//! Create, update and delete Perspective resources inside a working tree.
//!
//! These run inside [`with_mutable_project`](crate::archive::with_mutable_project):
//! they only touch files under the given root and never talk to the gateway.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::kind::{RESOURCE_META_FILE, ResourceKind};
use super::metadata::{ResourceMeta, refresh_audit};
use crate::archive::{ArchiveError, ProjectArchive};

/// Writes `value` as 2-space-indented JSON with a trailing newline,
/// creating parent directories.
///
/// # Errors
///
/// [`ArchiveError::Io`] on write failure.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
    }
    let mut text = serde_json::to_string_pretty(value).map_err(|source| {
        ArchiveError::MalformedJson {
            path: path.display().to_string(),
            source,
        }
    })?;
    text.push('\n');
    fs::write(path, text).map_err(|e| ArchiveError::io(path, e))
}

fn read_json(path: &Path) -> Result<Value, ArchiveError> {
    let bytes = fs::read(path).map_err(|e| ArchiveError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| ArchiveError::MalformedJson {
        path: path.display().to_string(),
        source,
    })
}

fn not_found(kind: ResourceKind, id: Option<&str>) -> ArchiveError {
    ArchiveError::ResourceNotFound {
        resource: kind.describe(id),
    }
}

/// Creates a resource: payload plus a fresh `resource.json`.
///
/// # Errors
///
/// [`ArchiveError::AlreadyExists`] when the payload file is already present
/// (nothing is written), [`ArchiveError::InvalidIdentifier`], or IO failures.
#[instrument(skip(root, payload), fields(kind = %kind))]
pub fn create_resource(
    root: &Path,
    kind: ResourceKind,
    id: Option<&str>,
    payload: &Value,
) -> Result<(), ArchiveError> {
    let dir = kind.resource_dir(root, id)?;
    let payload_path = dir.join(kind.payload_file());
    if payload_path.exists() {
        return Err(ArchiveError::AlreadyExists {
            resource: kind.describe(id),
        });
    }

    write_json(&payload_path, payload)?;
    let meta = ResourceMeta::new(vec![kind.payload_file().to_string()], Utc::now());
    write_json(&dir.join(RESOURCE_META_FILE), &meta)?;
    debug!(dir = %dir.display(), "resource created");
    Ok(())
}

/// Overwrites a resource's payload and refreshes its audit stamp.
///
/// Only `attributes.lastModification.actor` and `.timestamp` change in an
/// existing `resource.json`; a missing one is left missing.
///
/// # Errors
///
/// [`ArchiveError::ResourceNotFound`] when the payload file is absent,
/// [`ArchiveError::MalformedJson`] for an unreadable `resource.json`.
#[instrument(skip(root, payload), fields(kind = %kind))]
pub fn update_resource(
    root: &Path,
    kind: ResourceKind,
    id: Option<&str>,
    payload: &Value,
) -> Result<(), ArchiveError> {
    let dir = kind.resource_dir(root, id)?;
    let payload_path = dir.join(kind.payload_file());
    if !payload_path.is_file() {
        return Err(not_found(kind, id));
    }

    let meta_path = dir.join(RESOURCE_META_FILE);
    let meta = if meta_path.is_file() {
        let mut meta = read_json(&meta_path)?;
        refresh_audit(&mut meta, Utc::now()).map_err(|source| ArchiveError::MalformedJson {
            path: meta_path.display().to_string(),
            source,
        })?;
        Some(meta)
    } else {
        None
    };

    write_json(&payload_path, payload)?;
    if let Some(meta) = meta {
        write_json(&meta_path, &meta)?;
    }
    debug!(dir = %dir.display(), "resource updated");
    Ok(())
}

/// Removes a resource's whole directory.
///
/// # Errors
///
/// [`ArchiveError::SingletonDelete`] for singleton kinds and
/// [`ArchiveError::ResourceNotFound`] when the directory is absent.
#[instrument(skip(root), fields(kind = %kind))]
pub fn delete_resource(root: &Path, kind: ResourceKind, id: &str) -> Result<(), ArchiveError> {
    if kind.is_singleton() {
        return Err(ArchiveError::SingletonDelete {
            kind: kind.label().to_string(),
        });
    }
    let dir = kind.resource_dir(root, Some(id))?;
    if !dir.is_dir() {
        return Err(not_found(kind, Some(id)));
    }
    fs::remove_dir_all(&dir).map_err(|e| ArchiveError::io(&dir, e))?;
    debug!(dir = %dir.display(), "resource deleted");
    Ok(())
}

/// Sorted identifiers of `kind` in an opened archive. Empty for singletons.
#[must_use]
pub fn list_ids(archive: &ProjectArchive, kind: ResourceKind) -> Vec<String> {
    if kind.is_singleton() {
        return Vec::new();
    }
    archive.list_entries(&kind.category_prefix(), kind.payload_file())
}

/// A page route and the view it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoute {
    /// URL route, e.g. `/` or `/alarms`.
    pub route: String,
    /// View path shown at that route; empty when unset.
    pub view_path: String,
}

/// Page routes from a page-config document, sorted by route.
#[must_use]
pub fn page_routes(config: &Value) -> Vec<PageRoute> {
    let Some(pages) = config.get("pages").and_then(Value::as_object) else {
        return Vec::new();
    };
    let mut routes: Vec<PageRoute> = pages
        .iter()
        .map(|(route, page)| PageRoute {
            route: route.clone(),
            view_path: page
                .get("viewPath")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect();
    routes.sort_by(|a, b| a.route.cmp(&b.route));
    routes
}
