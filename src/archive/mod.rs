//! Project archive round trips.
//!
//! Two entry points sit on top of [`ProjectTransfer`](crate::client::ProjectTransfer):
//!
//! - [`with_project_archive`] exports a project and exposes it read-only.
//! - [`with_mutable_project`] exports, extracts, lets the caller edit the
//!   working tree, repacks deterministically and imports with overwrite.
//!
//! Temporary files live in a private directory that is removed on every
//! exit path; removal failures are logged and never mask the result.

mod engine;
mod error;
mod extract;
mod repack;

pub use engine::{
    ProjectArchive, RoundTripStage, list_entries_in, list_resources, read_resource,
    with_mutable_project, with_project_archive,
};
pub use error::ArchiveError;
pub use extract::{extract_all, safe_join};
pub use repack::{collect_entry_names, repack};
