//! Keeping a project in step with something else: another gateway (diff)
//! or a local directory (watch).

mod diff;
mod watch;

pub use diff::{canonical_json, project_diff};
pub use watch::{
    ChangeKind, FileChange, SyncSummary, WatchError, classify, remote_resource_path, start_watcher,
    sync_change, sync_events,
};
