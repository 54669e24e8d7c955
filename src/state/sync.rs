//! Keeps the tree in step with the file open in the log viewer.
//!
//! When the active file changes, the tree must show the file and have it
//! selected. If the tree is rooted at the file's parent directory, or already
//! contains the file somewhere below its root, only the selection moves;
//! otherwise the tree is rebuilt at the file's parent.

use super::tree_session::{ScanRequest, TreeSession, TreeState};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What the tree needs to do to follow the active file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// No file is active.
    Nothing,
    /// The tree already shows the file.
    Select {
        /// File to select.
        file: PathBuf,
    },
    /// The tree must be rebuilt at `root`, then `file` selected.
    Rescan {
        /// The file's parent directory.
        root: PathBuf,
        /// File to select once the scan lands.
        file: PathBuf,
    },
}

/// Stateless: every decision is made from the two snapshots it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncController;

impl SyncController {
    /// Decide how the tree should follow `active_file`.
    pub fn plan(active_file: Option<&Path>, tree: &TreeState) -> SyncAction {
        let Some(file) = active_file else {
            return SyncAction::Nothing;
        };
        let shown = tree.tree().is_some_and(|t| t.find(file).is_some());
        match file.parent() {
            Some(parent)
                if !parent.as_os_str().is_empty() && tree.root() != Some(parent) && !shown =>
            {
                SyncAction::Rescan {
                    root: parent.to_path_buf(),
                    file: file.to_path_buf(),
                }
            }
            _ => SyncAction::Select {
                file: file.to_path_buf(),
            },
        }
    }

    /// Carry out `action` on the tree session.
    ///
    /// A rescan is only started here; the returned request must be run and
    /// fed back through [`TreeSession::finish_load`], which selects the file
    /// once the scan succeeds.
    pub fn apply(action: SyncAction, tree: &mut TreeSession) -> Option<ScanRequest> {
        match action {
            SyncAction::Nothing => None,
            SyncAction::Select { file } => {
                debug!(file = ?file, "Sync: selecting in current tree");
                tree.select_file(file);
                None
            }
            SyncAction::Rescan { root, file } => {
                debug!(root = ?root, file = ?file, "Sync: rescanning parent directory");
                Some(tree.begin_load_and_select(&root, Some(file)))
            }
        }
    }
}
