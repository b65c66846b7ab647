//! Load-once bookkeeping for required modules.

use std::path::{Path, PathBuf};

/// Tracks which canonical module paths have completed loading or are mid-load.
///
/// `loaded` grows monotonically and keeps load order, so other subsystems can
/// inspect what was required and when. `in_progress` reflects nested-call
/// state only: the runtime is single-threaded cooperative, so the set exists
/// to let a cyclic `require` observe its own load and back off, not to
/// arbitrate races.
///
/// Membership checks are pure; the ledger never touches the filesystem.
#[derive(Debug, Default)]
pub struct LoadLedger {
    loaded: Vec<PathBuf>,
    in_progress: Vec<PathBuf>,
}

impl LoadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `path` has finished loading or is currently loading.
    pub fn already_handled(&self, path: &Path) -> bool {
        self.loaded.iter().any(|p| p == path) || self.in_progress.iter().any(|p| p == path)
    }

    /// Mark `path` as mid-load. The caller must have checked
    /// [`Self::already_handled`] immediately prior.
    pub fn begin(&mut self, path: PathBuf) {
        self.in_progress.push(path);
    }

    /// Close out a load started with [`Self::begin`]. The in-progress entry
    /// is removed on success and failure alike; only a successful load is
    /// committed, so a failed path stays eligible for retry.
    pub fn finish(&mut self, path: &Path, ok: bool) {
        self.in_progress.retain(|p| p != path);
        if ok {
            self.loaded.push(path.to_path_buf());
        }
    }

    /// Successfully loaded paths, in load order.
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Number of loads currently underway (nested calls only).
    pub fn in_progress_count(&self) -> usize {
        self.in_progress.len()
    }
}
