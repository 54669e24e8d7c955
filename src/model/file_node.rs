//! Directory tree nodes stored in an arena.
//!
//! A `FileTree` owns every node in a flat `Vec`; children are referenced by
//! `NodeId`. Expand/collapse state is deliberately absent here: it lives in
//! `TreeState` keyed by `NodeId`, so toggling never rebuilds the tree.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Opaque, stable identifier of a node within one `FileTree`.
///
/// Ids are only meaningful for the tree that issued them; a rebuild issues
/// a fresh set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the owning tree's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One file-or-directory entry in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    name: String,
    path: PathBuf,
    is_directory: bool,
    depth: usize,
    #[serde(skip)]
    children: Vec<NodeId>,
}

impl FileNode {
    /// A directory node; children are attached through [`FileTree::add_child`].
    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_directory: true,
            depth,
            children: Vec::new(),
        }
    }

    /// A file (leaf) node.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_directory: false,
            depth,
            children: Vec::new(),
        }
    }

    /// Display name: the file name, or the absolute path for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True for directories, including the root.
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Distance from the root (root = 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Children in display order. Always empty for files.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed directory hierarchy with a single root.
///
/// Invariant: node 0 is the root; every other node is reachable from it and
/// appears exactly once in its parent's `children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTree {
    nodes: Vec<FileNode>,
    by_path: HashMap<PathBuf, NodeId>,
}

impl FileTree {
    /// Create a tree containing only `root`.
    pub fn new(root: FileNode) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            by_path: HashMap::new(),
        };
        tree.push(root);
        tree
    }

    fn push(&mut self, node: FileNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.by_path.insert(node.path.clone(), id);
        self.nodes.push(node);
        id
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// Returns `None` if `parent` is not a directory node of this tree.
    pub fn add_child(&mut self, parent: NodeId, node: FileNode) -> Option<NodeId> {
        if !self.nodes.get(parent.0)?.is_directory {
            return None;
        }
        let id = self.push(node);
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    /// Id of the root node, always valid.
    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// The root node.
    pub fn root(&self) -> &FileNode {
        &self.nodes[0]
    }

    /// Node with `id`, or `None` for an id from another tree.
    pub fn get(&self, id: NodeId) -> Option<&FileNode> {
        self.nodes.get(id.0)
    }

    /// Look up a node by its absolute path.
    pub fn find(&self, path: &Path) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of file (non-directory) nodes.
    pub fn file_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_directory).count()
    }

    /// Pre-order iterator over all nodes with their ids, regardless of expand state.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &FileNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}
