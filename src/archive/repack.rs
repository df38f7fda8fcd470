//! Deterministic repacking of a working tree into a project archive.
//!
//! Identical file sets always produce byte-identical archives: entries are
//! written in sorted path order with fixed timestamps and permissions.

use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, instrument};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::error::ArchiveError;

/// Archive entry names (`/`-separated) of every regular file under `root`, sorted.
///
/// Ordering is segment by segment, so `a/b` sorts before `a-b` regardless
/// of platform separator.
///
/// # Errors
///
/// [`ArchiveError::Io`] when the tree cannot be walked, or
/// [`ArchiveError::UnsafeEntryPath`] for a file name that is not UTF-8.
pub fn collect_entry_names(root: &Path) -> Result<Vec<String>, ArchiveError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            ArchiveError::io(path, io::Error::other(e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| ArchiveError::io(entry.path(), io::Error::other(e)))?;
        let segments = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ArchiveError::UnsafeEntryPath {
                entry: relative.display().to_string(),
            })?;
        names.push(segments.join("/"));
    }
    names.sort_by(|a, b| compare_entry_names(a, b));
    Ok(names)
}

fn compare_entry_names(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}

/// Writes every regular file under `root` into a new archive at `dest`.
///
/// Returns the number of entries written.
///
/// # Errors
///
/// [`ArchiveError::Io`] or [`ArchiveError::Zip`].
#[instrument(skip_all, fields(root = %root.display(), dest = %dest.display()))]
pub fn repack(root: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let names = collect_entry_names(root)?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let out = File::create(dest).map_err(|e| ArchiveError::io(dest, e))?;
    let mut writer = ZipWriter::new(out);
    for name in &names {
        let source_path = root.join(name);
        let mut source = File::open(&source_path).map_err(|e| ArchiveError::io(&source_path, e))?;
        writer.start_file(name.as_str(), options)?;
        io::copy(&mut source, &mut writer).map_err(|e| ArchiveError::io(&source_path, e))?;
    }
    writer.finish()?;

    debug!(entries = names.len(), "archive repacked");
    Ok(names.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn populate(root: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn test_compare_entry_names_is_segment_wise() {
        let mut names = vec!["a-b/x", "a/b", "a/a/z", "B"];
        names.sort_by(|a, b| compare_entry_names(a, b));
        assert_eq!(names, ["B", "a/a/z", "a/b", "a-b/x"]);
    }

    #[test]
    fn test_collect_entry_names_skips_directories() {
        let temp = TempDir::new().unwrap();
        populate(temp.path(), &[("z.json", "{}"), ("a/b/c.json", "{}")]);
        fs::create_dir_all(temp.path().join("empty/dir")).unwrap();
        assert_eq!(
            collect_entry_names(temp.path()).unwrap(),
            ["a/b/c.json", "z.json"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_entry_names_rejects_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("views");
        fs::create_dir_all(&dir).unwrap();
        let bad = dir.join(OsStr::from_bytes(b"caf\xe9.json"));
        if fs::write(&bad, "{}").is_err() {
            // Filesystem refuses non-UTF-8 names.
            return;
        }

        let err = collect_entry_names(temp.path()).unwrap_err();
        assert!(
            matches!(err, ArchiveError::UnsafeEntryPath { ref entry } if entry.starts_with("views/caf")),
            "{err:?}"
        );
    }

    #[test]
    fn test_repack_is_byte_deterministic() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        // Same content, created in different orders.
        populate(&first, &[("b/view.json", "{\"b\":1}"), ("a/view.json", "{\"a\":1}")]);
        populate(&second, &[("a/view.json", "{\"a\":1}"), ("b/view.json", "{\"b\":1}")]);

        let first_zip = temp.path().join("first.zip");
        let second_zip = temp.path().join("second.zip");
        repack(&first, &first_zip).unwrap();
        repack(&second, &second_zip).unwrap();

        assert_eq!(fs::read(&first_zip).unwrap(), fs::read(&second_zip).unwrap());
    }

    #[test]
    fn test_repack_writes_relative_names_and_content() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("tree");
        populate(&root, &[("project.json", "{\"title\":\"x\"}"), ("com.x/views/A/view.json", "{}")]);
        let dest = temp.path().join("out.zip");

        assert_eq!(repack(&root, &dest).unwrap(), 2);

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<_> = archive.file_names().map(str::to_string).collect();
        assert_eq!(names.len(), 2);
        let mut content = String::new();
        archive
            .by_name("project.json")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "{\"title\":\"x\"}");
    }
}
