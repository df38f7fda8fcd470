//! Pushes local file changes under a directory to a project's resources.
//!
//! A `notify` watcher feeds filesystem events into a channel; [`sync_events`]
//! drains it, turning each event into a PUT (file written) or DELETE (file
//! gone) against `/projects/{name}/resources/{relative path}`. A failed sync
//! is logged and the loop carries on.

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use reqwest::Method;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{debug, info, warn};

use crate::client::{GatewayClient, GatewayError, RequestBody, encode_segment, read_body};

const RESOURCE_CONTENT_TYPE: &str = "application/octet-stream";

/// Failures that stop a watch session. Per-file sync errors never do.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The directory to watch does not exist.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The watcher could not be created or attached.
    #[error("failed to watch {}", .path.display())]
    Watcher {
        /// Watched directory.
        path: PathBuf,
        /// Underlying watcher error.
        #[source]
        source: notify::Error,
    },
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Created or modified; its contents should be uploaded.
    Written,
    /// Deleted or renamed away.
    Removed,
}

/// One file change, relative to the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Change kind.
    pub kind: ChangeKind,
    /// `/`-separated path below the root.
    pub relative: String,
}

/// Outcome counts for a finished [`sync_events`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Changes pushed to the gateway.
    pub synced: usize,
    /// Changes the gateway refused or that could not be read.
    pub failed: usize,
}

/// Translates a watcher event into file changes under `root`.
///
/// Access and metadata-only events are ignored, as are directories and
/// paths outside `root` or not valid UTF-8.
#[must_use]
pub fn classify(event: &Event, root: &Path) -> Vec<FileChange> {
    let removed_by_kind = match event.kind {
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => true,
        EventKind::Create(_) | EventKind::Modify(_) => false,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter_map(|path| {
            let relative = relative_name(root, path)?;
            let kind = if removed_by_kind || !path.exists() {
                ChangeKind::Removed
            } else if path.is_file() {
                ChangeKind::Written
            } else {
                return None;
            };
            Some(FileChange { kind, relative })
        })
        .collect()
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    (!segments.is_empty()).then(|| segments.join("/"))
}

/// API path of a project resource file, each segment percent-encoded.
#[must_use]
pub fn remote_resource_path(project: &str, relative: &str) -> String {
    let encoded: Vec<String> = relative.split('/').map(encode_segment).collect();
    format!(
        "/projects/{}/resources/{}",
        encode_segment(project),
        encoded.join("/")
    )
}

/// Pushes one change to the gateway.
///
/// # Errors
///
/// The gateway's error, or [`GatewayError::Io`] when a written file can no
/// longer be read.
pub async fn sync_change(
    client: &GatewayClient,
    project: &str,
    root: &Path,
    change: &FileChange,
) -> Result<(), GatewayError> {
    let path = remote_resource_path(project, &change.relative);
    match change.kind {
        ChangeKind::Written => {
            let local = root.join(&change.relative);
            let data = tokio::fs::read(&local)
                .await
                .map_err(|e| GatewayError::io(&local, e))?;
            let body = RequestBody::Bytes {
                data,
                content_type: RESOURCE_CONTENT_TYPE.to_string(),
            };
            let response = client.request(Method::PUT, &path, &[], body).await?;
            read_body(response).await?;
        }
        ChangeKind::Removed => {
            client.delete(&path, &[]).await?;
        }
    }
    Ok(())
}

/// Drains `events` until the channel closes, syncing every change.
///
/// Each change is logged at info; failures are logged with `warn!` and
/// counted, never returned.
pub async fn sync_events(
    client: &GatewayClient,
    project: &str,
    root: &Path,
    mut events: UnboundedReceiver<notify::Result<Event>>,
) -> SyncSummary {
    let mut summary = SyncSummary::default();
    while let Some(event) = events.recv().await {
        let event = match event {
            Ok(event) => event,
            Err(error) => {
                warn!(error = %error, "watch error");
                continue;
            }
        };
        for change in classify(&event, root) {
            let action = match change.kind {
                ChangeKind::Written => "written",
                ChangeKind::Removed => "removed",
            };
            info!(path = %change.relative, action, "local change");
            match sync_change(client, project, root, &change).await {
                Ok(()) => summary.synced += 1,
                Err(error) => {
                    warn!(path = %change.relative, error = %error, "could not sync resource");
                    summary.failed += 1;
                }
            }
        }
    }
    debug!(synced = summary.synced, failed = summary.failed, "event stream closed");
    summary
}

/// A running recursive watcher over `root` and the channel it feeds.
///
/// Dropping the returned watcher stops events and closes the channel.
///
/// # Errors
///
/// [`WatchError::DirectoryNotFound`] or [`WatchError::Watcher`].
pub fn start_watcher(
    root: &Path,
) -> Result<(RecommendedWatcher, UnboundedReceiver<notify::Result<Event>>), WatchError> {
    if !root.is_dir() {
        return Err(WatchError::DirectoryNotFound(root.to_path_buf()));
    }
    let watcher_error = |source| WatchError::Watcher {
        path: root.to_path_buf(),
        source,
    };

    let (tx, rx) = unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |event| {
            // Receiver gone means the session is over.
            let _ = tx.send(event);
        },
        Config::default(),
    )
    .map_err(watcher_error)?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(watcher_error)?;

    debug!(root = %root.display(), "watcher started");
    Ok((watcher, rx))
}
