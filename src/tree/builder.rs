//! Directory tree construction.
//!
//! `build` walks the filesystem below a root and keeps only the files the
//! scanner confirmed, pruning directories that end up with no files.

use crate::model::{FileNode, FileTree, NodeId};
use crate::source::has_log_extension;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Deepest level a node may sit at. Anything below is dropped.
pub const MAX_DEPTH: usize = 20;

/// Node under construction, before it is laid out in the arena.
struct Draft {
    node: FileNode,
    children: Vec<Draft>,
}

/// Build the tree rooted at `root`, keeping only files listed in `valid_paths`.
///
/// - A file is kept iff it has a log extension AND its absolute path is in `valid_paths`.
/// - A directory is kept iff it (transitively) contains a kept file. The root
///   is always kept, even when empty or unreadable.
/// - Children are ordered directories first, then by name.
/// - Nodes deeper than [`MAX_DEPTH`] are dropped, and a directory whose
///   canonical path was already visited is not entered again.
/// - Symlinks are followed, matching `WalkDirScanner`.
///
/// Never fails: unreadable directories simply contribute no children.
pub fn build(root: &Path, valid_paths: &HashSet<PathBuf>) -> FileTree {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let mut visited = HashSet::new();

    let children = build_children(&root, valid_paths, 0, &mut visited);
    let draft = Draft {
        node: root_node(&root),
        children,
    };

    let mut tree = FileTree::new(draft.node);
    let root_id = tree.root_id();
    for child in draft.children {
        insert(&mut tree, root_id, child);
    }

    debug!(
        root = ?root,
        nodes = tree.len(),
        files = tree.file_count(),
        "Built file tree"
    );
    tree
}

/// A tree holding only the root, as shown when there is nothing to list.
pub fn root_only(root: &Path) -> FileTree {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    FileTree::new(root_node(&root))
}

fn root_node(root: &Path) -> FileNode {
    FileNode::directory(root.display().to_string(), root.to_path_buf(), 0)
}

fn insert(tree: &mut FileTree, parent: NodeId, draft: Draft) {
    if let Some(id) = tree.add_child(parent, draft.node) {
        for child in draft.children {
            insert(tree, id, child);
        }
    }
}

/// Directory child discovered by `read_dir`.
struct Entry {
    name: OsString,
    path: PathBuf,
    is_dir: bool,
}

fn entry_order(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name))
}

/// Kept children of `dir`, which itself sits at `depth`.
fn build_children(
    dir: &Path,
    valid_paths: &HashSet<PathBuf>,
    depth: usize,
    visited: &mut HashSet<PathBuf>,
) -> Vec<Draft> {
    let child_depth = depth + 1;
    if child_depth > MAX_DEPTH {
        return Vec::new();
    }

    let identity = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    if !visited.insert(identity) {
        trace!(dir = ?dir, "Directory already visited, not descending");
        return Vec::new();
    }

    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(err) => {
            debug!(dir = ?dir, error = %err, "Cannot list directory");
            return Vec::new();
        }
    };

    let mut entries: Vec<Entry> = read_dir
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            Entry {
                name: entry.file_name(),
                is_dir: path.is_dir(),
                path,
            }
        })
        .collect();
    entries.sort_by(entry_order);

    entries
        .into_iter()
        .filter_map(|entry| {
            let name = entry.name.to_string_lossy().into_owned();
            if entry.is_dir {
                let children = build_children(&entry.path, valid_paths, child_depth, visited);
                if children.is_empty() {
                    return None;
                }
                Some(Draft {
                    node: FileNode::directory(name, entry.path, child_depth),
                    children,
                })
            } else if has_log_extension(&entry.path) && valid_paths.contains(&entry.path) {
                Some(Draft {
                    node: FileNode::file(name, entry.path, child_depth),
                    children: Vec::new(),
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
