//! Zip-slip-safe extraction of a project archive into a working tree.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, instrument};
use zip::ZipArchive;

use super::error::ArchiveError;

const S_IFMT: u32 = 0o170_000;
const S_IFLNK: u32 = 0o120_000;

/// Joins an archive entry name onto `dest`, refusing anything that could escape it.
///
/// Rejects absolute names, drive prefixes, `..` segments and backslashes.
///
/// # Errors
///
/// [`ArchiveError::UnsafeEntryPath`] naming the offending entry.
pub fn safe_join(dest: &Path, entry_name: &str) -> Result<PathBuf, ArchiveError> {
    let unsafe_entry = || ArchiveError::UnsafeEntryPath {
        entry: entry_name.to_string(),
    };

    if entry_name.contains('\\') || entry_name.contains('\0') {
        return Err(unsafe_entry());
    }

    let mut safe_path = dest.to_path_buf();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(name) => safe_path.push(name),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_entry());
            }
        }
    }

    if safe_path == dest || !safe_path.starts_with(dest) {
        return Err(unsafe_entry());
    }
    Ok(safe_path)
}

/// True for directory entries such as `./` or `/` that name the archive root itself.
fn names_archive_root(entry_name: &str) -> bool {
    entry_name
        .split('/')
        .all(|segment| segment.is_empty() || segment == ".")
}

/// Extracts every entry of `archive_path` under `dest`, returning the file count.
///
/// Directory structure is preserved. Symlink entries are rejected, as is
/// any entry that would land outside `dest`; nothing after the first
/// rejected entry is written.
///
/// # Errors
///
/// [`ArchiveError::UnsafeEntryPath`], [`ArchiveError::Zip`] for a corrupt
/// container, or [`ArchiveError::Io`].
#[instrument(skip_all, fields(archive = %archive_path.display(), dest = %dest.display()))]
pub fn extract_all(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive_path).map_err(|e| ArchiveError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(dest).map_err(|e| ArchiveError::io(dest, e))?;

    let mut files_written = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        if entry
            .unix_mode()
            .is_some_and(|mode| mode & S_IFMT == S_IFLNK)
        {
            return Err(ArchiveError::UnsafeEntryPath { entry: name });
        }

        if entry.is_dir() && names_archive_root(&name) {
            debug!(entry = %name, "skipping root directory entry");
            continue;
        }

        let target = safe_join(dest, &name)?;
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ArchiveError::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
        }
        let mut out = File::create(&target).map_err(|e| ArchiveError::io(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| ArchiveError::io(&target, e))?;
        files_written += 1;
    }

    debug!(files_written, "archive extracted");
    Ok(files_written)
}
