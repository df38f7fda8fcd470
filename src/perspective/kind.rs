//! Perspective resource categories and identifier rules.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::archive::ArchiveError;

/// Module namespace every Perspective resource lives under.
pub const PERSPECTIVE_NAMESPACE: &str = "com.inductiveautomation.perspective";

/// Sibling metadata file of every resource.
pub const RESOURCE_META_FILE: &str = "resource.json";

/// A Perspective resource category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `views/<id>/view.json`
    View,
    /// `style-classes/<id>/style.json`
    StyleClass,
    /// `page-config/config.json` (singleton)
    PageConfig,
    /// `session-props/props.json` (singleton)
    SessionProps,
}

impl ResourceKind {
    /// Category directory under the namespace.
    #[must_use]
    pub fn category(self) -> &'static str {
        match self {
            Self::View => "views",
            Self::StyleClass => "style-classes",
            Self::PageConfig => "page-config",
            Self::SessionProps => "session-props",
        }
    }

    /// Payload file name inside a resource directory.
    #[must_use]
    pub fn payload_file(self) -> &'static str {
        match self {
            Self::View => "view.json",
            Self::StyleClass => "style.json",
            Self::PageConfig => "config.json",
            Self::SessionProps => "props.json",
        }
    }

    /// Singletons have one instance and no identifier segment.
    #[must_use]
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::PageConfig | Self::SessionProps)
    }

    /// Human-readable label used in messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::StyleClass => "style class",
            Self::PageConfig => "page configuration",
            Self::SessionProps => "session properties",
        }
    }

    /// `<namespace>/<category>`, the archive prefix for this kind.
    #[must_use]
    pub fn category_prefix(self) -> String {
        format!("{PERSPECTIVE_NAMESPACE}/{}", self.category())
    }

    /// Archive entry path of the payload.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::InvalidIdentifier`] per [`validate_identifier`].
    pub fn entry_path(self, id: Option<&str>) -> Result<String, ArchiveError> {
        Ok(match self.checked_id(id)? {
            Some(id) => format!("{}/{id}/{}", self.category_prefix(), self.payload_file()),
            None => format!("{}/{}", self.category_prefix(), self.payload_file()),
        })
    }

    /// Resource directory inside a working tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::InvalidIdentifier`] per [`validate_identifier`].
    pub fn resource_dir(self, root: &Path, id: Option<&str>) -> Result<PathBuf, ArchiveError> {
        let mut dir = root.join(PERSPECTIVE_NAMESPACE).join(self.category());
        if let Some(id) = self.checked_id(id)? {
            dir.extend(id.split('/'));
        }
        Ok(dir)
    }

    /// Display name of one resource, e.g. `view 'Main/Home'`.
    #[must_use]
    pub fn describe(self, id: Option<&str>) -> String {
        match id {
            Some(id) if !self.is_singleton() => format!("{} '{id}'", self.label()),
            _ => self.label().to_string(),
        }
    }

    fn checked_id(self, id: Option<&str>) -> Result<Option<&str>, ArchiveError> {
        match (self.is_singleton(), id) {
            (true, None) => Ok(None),
            (true, Some(id)) => Err(ArchiveError::invalid_identifier(
                id,
                format!("{} takes no identifier", self.label()),
            )),
            (false, None) => Err(ArchiveError::invalid_identifier(
                "",
                format!("a {} identifier is required", self.label()),
            )),
            (false, Some(id)) => {
                validate_identifier(id)?;
                Ok(Some(id))
            }
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Checks a `/`-separated resource identifier.
///
/// Identifiers must be non-empty and relative; no segment may be empty,
/// `.` or `..`, or contain a backslash.
///
/// # Errors
///
/// [`ArchiveError::InvalidIdentifier`] describing the first problem found.
pub fn validate_identifier(id: &str) -> Result<(), ArchiveError> {
    if id.is_empty() {
        return Err(ArchiveError::invalid_identifier(id, "identifier is empty"));
    }
    if id.starts_with('/') {
        return Err(ArchiveError::invalid_identifier(id, "identifier must be relative"));
    }
    for segment in id.split('/') {
        let reason = match segment {
            "" => "empty path segment",
            "." | ".." => "relative path segment",
            s if s.contains('\\') => "backslash in path segment",
            s if s.contains('\0') => "NUL in path segment",
            _ => continue,
        };
        return Err(ArchiveError::invalid_identifier(id, reason));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_paths() {
        assert_eq!(
            ResourceKind::View.entry_path(Some("Page/Home")).unwrap(),
            "com.inductiveautomation.perspective/views/Page/Home/view.json"
        );
        assert_eq!(
            ResourceKind::PageConfig.entry_path(None).unwrap(),
            "com.inductiveautomation.perspective/page-config/config.json"
        );
        assert_eq!(
            ResourceKind::SessionProps.entry_path(None).unwrap(),
            "com.inductiveautomation.perspective/session-props/props.json"
        );
    }

    #[test]
    fn test_resource_dir_nests_identifier_segments() {
        let dir = ResourceKind::StyleClass
            .resource_dir(Path::new("/tree"), Some("theme/primary"))
            .unwrap();
        assert_eq!(
            dir,
            PathBuf::from("/tree/com.inductiveautomation.perspective/style-classes/theme/primary")
        );
    }

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("Folder/View 1").is_ok());
        for bad in ["", "/abs", "a//b", "a/../b", "./a", "a\\b", "trailing/"] {
            assert!(
                matches!(validate_identifier(bad), Err(ArchiveError::InvalidIdentifier { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_singleton_rejects_identifier_and_named_kind_requires_one() {
        assert!(ResourceKind::PageConfig.entry_path(Some("x")).is_err());
        assert!(ResourceKind::View.entry_path(None).is_err());
    }

    #[test]
    fn test_describe() {
        assert_eq!(ResourceKind::View.describe(Some("Main")), "view 'Main'");
        assert_eq!(ResourceKind::SessionProps.describe(None), "session properties");
    }
}
