//! Errors raised by the archive round-trip engine and the resource layer.
//!
//! Remote failures arrive wrapped in [`ArchiveError::Gateway`] unchanged;
//! every other variant is a local structural failure, so callers can tell
//! "the gateway said no" apart from "the archive was not what we expected".

use std::path::PathBuf;

use thiserror::Error;

use crate::client::GatewayError;

/// Errors for project archive reads and read-modify-write cycles.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// An expected archive entry is absent.
    #[error("not found in project archive: {path}")]
    EntryNotFound {
        /// Entry path that was looked up.
        path: String,
    },

    /// An archive entry or working-tree file is not valid JSON.
    #[error("malformed JSON in {path}: {source}")]
    MalformedJson {
        /// Entry or file path.
        path: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// An archive entry would extract outside the working tree.
    #[error("unsafe archive entry path: {entry}")]
    UnsafeEntryPath {
        /// Entry name as stored in the archive.
        entry: String,
    },

    /// Create was asked for a resource that already exists.
    #[error("{resource} already exists")]
    AlreadyExists {
        /// Resource description, e.g. `view 'Main/Home'`.
        resource: String,
    },

    /// Update or delete was asked for a resource that does not exist.
    #[error("{resource} not found in project")]
    ResourceNotFound {
        /// Resource description, e.g. `view 'Main/Home'`.
        resource: String,
    },

    /// A resource identifier is empty, absolute, or contains an unsafe segment.
    #[error("invalid resource identifier '{id}': {reason}")]
    InvalidIdentifier {
        /// Identifier as given.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Singleton resources have exactly one instance and cannot be deleted.
    #[error("{kind} is a singleton resource and cannot be deleted")]
    SingletonDelete {
        /// Resource kind label.
        kind: String,
    },

    /// The archive container itself is unreadable or could not be written.
    #[error("project archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Local file system error inside the working tree.
    #[error("IO error at {path}: {source}")]
    Io {
        /// File path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid-identifier error.
    pub fn invalid_identifier(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for local archive content problems (bad JSON, unsafe paths, corrupt zip).
    #[must_use]
    pub fn is_malformed_data(&self) -> bool {
        matches!(
            self,
            Self::MalformedJson { .. } | Self::UnsafeEntryPath { .. } | Self::Zip(_)
        )
    }
}
