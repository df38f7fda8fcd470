//! Export/extract/mutate/repack/import round trips against a gateway project.
//!
//! The gateway has no partial-update API for project resources, so every
//! change is a full-project replace:
//!
//! ```text
//! idle -> exporting -> extracting -> mutating -> repacking -> importing -> cleaning-up -> done
//! ```
//!
//! Any failure jumps straight to `cleaning-up`. The private working directory
//! is removed exactly once on every exit path, and the import is only sent
//! when every earlier stage succeeded. Concurrent round trips against the
//! same project are not coordinated: the last import wins.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use super::error::ArchiveError;
use super::extract::extract_all;
use super::repack::repack;
use crate::client::ProjectTransfer;

const WORKDIR_PREFIX: &str = "ignition-cli-";
const EXPORT_FILE_NAME: &str = "export.zip";
const IMPORT_FILE_NAME: &str = "import.zip";
const WORKING_TREE_DIR: &str = "project";

/// Stages of a round trip, used to tag log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTripStage {
    /// Downloading the project archive.
    Exporting,
    /// Unpacking into the working tree.
    Extracting,
    /// Caller is editing the working tree.
    Mutating,
    /// Building the replacement archive.
    Repacking,
    /// Uploading the replacement archive.
    Importing,
    /// Removing the working directory.
    CleaningUp,
    /// Finished.
    Done,
}

impl RoundTripStage {
    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exporting => "exporting",
            Self::Extracting => "extracting",
            Self::Mutating => "mutating",
            Self::Repacking => "repacking",
            Self::Importing => "importing",
            Self::CleaningUp => "cleaning-up",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RoundTripStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(stage: RoundTripStage, project: &str) {
    debug!(stage = stage.as_str(), project, "round-trip stage");
}

/// A read-only, opened project export.
pub struct ProjectArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
    names: Vec<String>,
}

impl fmt::Debug for ProjectArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectArchive")
            .field("path", &self.path)
            .field("entries", &self.names.len())
            .finish_non_exhaustive()
    }
}

impl ProjectArchive {
    /// Opens an archive file.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Io`] or [`ArchiveError::Zip`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let path = path.into();
        let file = File::open(&path).map_err(|e| ArchiveError::io(&path, e))?;
        let archive = ZipArchive::new(file)?;
        let names = archive.file_names().map(str::to_string).collect();
        Ok(Self {
            path,
            archive,
            names,
        })
    }

    /// Location of the archive file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry name, in archive order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Identifiers under `category_prefix` whose payload is `payload_file`.
    ///
    /// See [`list_entries_in`].
    #[must_use]
    pub fn list_entries(&self, category_prefix: &str, payload_file: &str) -> Vec<String> {
        list_entries_in(self.entry_names(), category_prefix, payload_file)
    }

    /// Raw bytes of an entry.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::EntryNotFound`] when `path` is not in the archive.
    pub fn read_bytes(&mut self, path: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut entry = self.archive.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => ArchiveError::EntryNotFound {
                path: path.to_string(),
            },
            other => ArchiveError::Zip(other),
        })?;
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::io(self.path.join(path), e))?;
        Ok(bytes)
    }

    /// An entry parsed as UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::EntryNotFound`] or [`ArchiveError::MalformedJson`].
    pub fn read_json(&mut self, path: &str) -> Result<Value, ArchiveError> {
        let bytes = self.read_bytes(path)?;
        serde_json::from_slice(&bytes).map_err(|source| ArchiveError::MalformedJson {
            path: path.to_string(),
            source,
        })
    }
}

/// Finds resource identifiers among archive entry names.
///
/// An entry matches when it starts with `<category_prefix>/` and ends with
/// `/<payload_file>`; the identifier is what lies between. Empty identifiers
/// are dropped. The result is deduplicated and sorted.
#[must_use]
pub fn list_entries_in<'a>(
    names: impl IntoIterator<Item = &'a str>,
    category_prefix: &str,
    payload_file: &str,
) -> Vec<String> {
    let prefix = format!("{}/", category_prefix.trim_end_matches('/'));
    let suffix = format!("/{payload_file}");

    names
        .into_iter()
        .filter_map(|name| name.strip_prefix(prefix.as_str()))
        .filter_map(|rest| rest.strip_suffix(suffix.as_str()))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn create_workdir() -> Result<TempDir, ArchiveError> {
    tempfile::Builder::new()
        .prefix(WORKDIR_PREFIX)
        .tempdir()
        .map_err(|e| ArchiveError::io(std::env::temp_dir(), e))
}

fn cleanup(workdir: TempDir, project: &str) {
    enter(RoundTripStage::CleaningUp, project);
    let path = workdir.path().to_path_buf();
    if let Err(error) = workdir.close() {
        warn!(path = %path.display(), %error, "failed to remove temporary directory");
    }
}

/// Exports `project` and hands the opened archive to `read`.
///
/// The export is streamed into a private temporary directory that is removed
/// when this returns, whatever `read` did. The remote project is never
/// modified.
///
/// # Errors
///
/// Export and archive-open failures, or whatever `read` returns.
#[instrument(skip(transfer, read), fields(project = %project))]
pub async fn with_project_archive<T, E, F>(
    transfer: &dyn ProjectTransfer,
    project: &str,
    read: F,
) -> Result<T, E>
where
    F: FnOnce(&mut ProjectArchive) -> Result<T, E>,
    E: From<ArchiveError>,
{
    let workdir = create_workdir()?;
    let outcome = open_and_read(transfer, project, workdir.path(), read).await;
    cleanup(workdir, project);
    enter(RoundTripStage::Done, project);
    outcome
}

async fn open_and_read<T, E, F>(
    transfer: &dyn ProjectTransfer,
    project: &str,
    workdir: &Path,
    read: F,
) -> Result<T, E>
where
    F: FnOnce(&mut ProjectArchive) -> Result<T, E>,
    E: From<ArchiveError>,
{
    enter(RoundTripStage::Exporting, project);
    let export_path = workdir.join(EXPORT_FILE_NAME);
    transfer
        .export_project(project, &export_path)
        .await
        .map_err(ArchiveError::from)?;

    let mut archive = ProjectArchive::open(export_path)?;
    read(&mut archive)
}

/// Runs one full read-modify-write cycle on `project`.
///
/// `mutate` receives the root of the extracted working tree and may change
/// any file under it. If it returns `Ok`, the tree is repacked in sorted
/// order and imported with `overwrite=true`; if it fails, nothing is
/// imported. The working directory is removed in both cases.
///
/// # Errors
///
/// Export, extraction, repack and import failures, or whatever `mutate` returns.
#[instrument(skip(transfer, mutate), fields(project = %project))]
pub async fn with_mutable_project<T, E, F>(
    transfer: &dyn ProjectTransfer,
    project: &str,
    mutate: F,
) -> Result<T, E>
where
    F: FnOnce(&Path) -> Result<T, E>,
    E: From<ArchiveError>,
{
    let workdir = create_workdir()?;
    let outcome = round_trip(transfer, project, workdir.path(), mutate).await;
    cleanup(workdir, project);
    enter(RoundTripStage::Done, project);
    outcome
}

async fn round_trip<T, E, F>(
    transfer: &dyn ProjectTransfer,
    project: &str,
    workdir: &Path,
    mutate: F,
) -> Result<T, E>
where
    F: FnOnce(&Path) -> Result<T, E>,
    E: From<ArchiveError>,
{
    enter(RoundTripStage::Exporting, project);
    let export_path = workdir.join(EXPORT_FILE_NAME);
    transfer
        .export_project(project, &export_path)
        .await
        .map_err(ArchiveError::from)?;

    enter(RoundTripStage::Extracting, project);
    let tree = workdir.join(WORKING_TREE_DIR);
    extract_all(&export_path, &tree)?;

    enter(RoundTripStage::Mutating, project);
    let value = mutate(&tree)?;

    enter(RoundTripStage::Repacking, project);
    let import_path = workdir.join(IMPORT_FILE_NAME);
    let entries = repack(&tree, &import_path)?;

    enter(RoundTripStage::Importing, project);
    transfer
        .import_project(project, &import_path, true)
        .await
        .map_err(ArchiveError::from)?;

    info!(project, entries, "project imported");
    Ok(value)
}

/// Sorted identifiers of one resource category in `project`.
///
/// # Errors
///
/// Export or archive-open failures.
pub async fn list_resources(
    transfer: &dyn ProjectTransfer,
    project: &str,
    category_prefix: &str,
    payload_file: &str,
) -> Result<Vec<String>, ArchiveError> {
    with_project_archive(transfer, project, |archive| {
        Ok(archive.list_entries(category_prefix, payload_file))
    })
    .await
}

/// One JSON entry of `project`, by its path inside the archive.
///
/// # Errors
///
/// [`ArchiveError::EntryNotFound`] when absent, [`ArchiveError::MalformedJson`]
/// when unparseable, plus export failures.
pub async fn read_resource(
    transfer: &dyn ProjectTransfer,
    project: &str,
    inner_path: &str,
) -> Result<Value, ArchiveError> {
    with_project_archive(transfer, project, |archive| archive.read_json(inner_path)).await
}
