//! Directory tree session: root, built tree, expand state, selection.
//!
//! Loading is split in two so the coordinating context can run the scan
//! wherever it likes:
//!
//! ```text
//! begin_load(root) -> ScanRequest --run(scanner)--> ScanOutcome -> finish_load
//! ```
//!
//! Every request carries a ticket. Only the outcome of the most recently
//! issued request is applied; older ones are dropped on arrival.

use super::observable::Observable;
use super::ticket::{Ticket, TicketSlot};
use crate::model::{FileNode, FileTree, NodeId, ScanError};
use crate::source::LogScanner;
use crate::tree;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ===== State =====

/// Snapshot of the tree session.
///
/// `tree` is `None` before the first load and while a load is in flight; a
/// failed scan leaves just the root. Expand state is keyed by node id and
/// only meaningful for the current `tree`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeState {
    root: Option<PathBuf>,
    tree: Option<Arc<FileTree>>,
    expanded: HashSet<NodeId>,
    selected: Option<PathBuf>,
    loading: bool,
}

impl TreeState {
    /// Root of the current or in-flight load.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Built tree; `None` before the first load and while loading.
    pub fn tree(&self) -> Option<&FileTree> {
        self.tree.as_deref()
    }

    /// Highlighted file.
    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    /// True while a scan is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Expand flag of the node at `path`. Files and unknown paths are never expanded.
    pub fn is_expanded(&self, path: &Path) -> bool {
        self.tree
            .as_ref()
            .and_then(|t| t.find(path))
            .is_some_and(|id| self.expanded.contains(&id))
    }

    /// Visible nodes in display order.
    ///
    /// Depth-first; a directory's children appear only when it is expanded.
    /// The iterator borrows this snapshot and is recomputed on each call.
    pub fn flatten(&self) -> Flatten<'_> {
        let stack = match &self.tree {
            Some(tree) => vec![tree.root_id()],
            None => Vec::new(),
        };
        Flatten {
            tree: self.tree.as_deref(),
            expanded: &self.expanded,
            stack,
        }
    }
}

/// One row of the flattened tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleNode<'a> {
    /// Node id in the tree.
    pub id: NodeId,
    /// The node itself.
    pub node: &'a FileNode,
    /// Whether its children are shown.
    pub expanded: bool,
}

/// Lazy iterator returned by [`TreeState::flatten`].
#[derive(Debug, Clone)]
pub struct Flatten<'a> {
    tree: Option<&'a FileTree>,
    expanded: &'a HashSet<NodeId>,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = VisibleNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree?;
        let id = self.stack.pop()?;
        let node = tree.get(id)?;
        let expanded = self.expanded.contains(&id);
        if expanded {
            self.stack.extend(node.children().iter().rev().copied());
        }
        Some(VisibleNode { id, node, expanded })
    }
}

// ===== Load Protocol =====

/// A scan to be performed for `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Orders this request against newer ones.
    pub ticket: Ticket,
    /// Absolute directory to scan.
    pub root: PathBuf,
    /// Path to select once the scan succeeds.
    pub select_after: Option<PathBuf>,
}

impl ScanRequest {
    /// Scan and build the tree. Touches the filesystem; safe to run off the
    /// coordinating thread.
    pub fn run(self, scanner: &dyn LogScanner) -> ScanOutcome {
        let result = scanner
            .scan(&self.root)
            .map(|valid| tree::build(&self.root, &valid));
        self.complete(result)
    }

    /// Pair this request with an already computed result.
    pub fn complete(self, result: Result<FileTree, ScanError>) -> ScanOutcome {
        ScanOutcome {
            request: self,
            result,
        }
    }
}

/// A scan request with its result.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The request that produced `result`.
    pub request: ScanRequest,
    /// Built tree or the scanner's error.
    pub result: Result<FileTree, ScanError>,
}

// ===== Session =====

/// Root, tree, expand state and selection of the directory browser.
#[derive(Debug, Default)]
pub struct TreeSession {
    state: Observable<TreeState>,
    scans: TicketSlot,
}

impl TreeSession {
    /// Session with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, borrowed.
    pub fn state(&self) -> &TreeState {
        self.state.get()
    }

    /// Current state as a shared snapshot.
    pub fn snapshot(&self) -> Arc<TreeState> {
        self.state.snapshot()
    }

    /// Receive every later state change.
    pub fn subscribe(&mut self) -> Receiver<Arc<TreeState>> {
        self.state.subscribe()
    }

    /// Whether a scan is outstanding.
    pub fn is_pending(&self) -> bool {
        self.scans.is_outstanding()
    }

    /// Start loading `root`: resets the tree and expand state, keeps the selection.
    pub fn begin_load(&mut self, root: &Path) -> ScanRequest {
        self.begin_load_and_select(root, None)
    }

    /// Like [`begin_load`](Self::begin_load), additionally selecting
    /// `select_after` once the scan succeeds.
    pub fn begin_load_and_select(&mut self, root: &Path, select_after: Option<PathBuf>) -> ScanRequest {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let ticket = self.scans.issue();

        debug!(root = ?root, %ticket, "Tree load started");
        self.state.update(|s| {
            s.root = Some(root.clone());
            s.tree = None;
            s.expanded.clear();
            s.loading = true;
        });

        ScanRequest {
            ticket,
            root,
            select_after,
        }
    }

    /// Apply a finished scan. Returns `false` when the outcome was stale and
    /// therefore ignored.
    ///
    /// A failed scan counts as "no valid files": the tree shows only the
    /// root. The error is logged, not stored.
    pub fn finish_load(&mut self, outcome: ScanOutcome) -> bool {
        let ScanOutcome { request, result } = outcome;
        if !self.scans.settle(request.ticket) {
            debug!(root = ?request.root, ticket = %request.ticket, "Discarding stale tree load");
            return false;
        }

        match result {
            Ok(tree) => {
                info!(
                    root = ?request.root,
                    nodes = tree.len(),
                    files = tree.file_count(),
                    "Tree loaded"
                );
                self.state.update(|s| {
                    s.expanded.clear();
                    s.expanded.insert(tree.root_id());
                    s.tree = Some(Arc::new(tree));
                    s.loading = false;
                    if let Some(path) = request.select_after {
                        s.selected = Some(path);
                    }
                });
            }
            Err(err) => {
                warn!(root = ?request.root, error = %err, "Tree scan failed, showing empty tree");
                let tree = tree::root_only(&request.root);
                self.state.update(|s| {
                    s.expanded.clear();
                    s.expanded.insert(tree.root_id());
                    s.tree = Some(Arc::new(tree));
                    s.loading = false;
                });
            }
        }
        true
    }

    /// Load `root` synchronously on the calling thread.
    pub fn load_directory(&mut self, root: &Path, scanner: &dyn LogScanner) {
        let request = self.begin_load(root);
        let outcome = request.run(scanner);
        self.finish_load(outcome);
    }

    /// Flip the expand flag of the directory at `path`.
    ///
    /// No-op (returns `false`) when no node has that path or it is a file.
    pub fn toggle_expand(&mut self, path: &Path) -> bool {
        let Some(id) = self
            .state
            .get()
            .tree()
            .and_then(|t| t.find(path).filter(|id| t.get(*id).is_some_and(FileNode::is_directory)))
        else {
            return false;
        };
        self.state.update(|s| {
            if !s.expanded.remove(&id) {
                s.expanded.insert(id);
            }
        });
        true
    }

    /// Mark `path` selected. The path is not required to exist in the tree.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(path = ?path, "Tree selection changed");
        self.state.update(|s| s.selected = Some(path));
    }
}

#[cfg(test)]
#[path = "tree_session_tests.rs"]
mod tests;
