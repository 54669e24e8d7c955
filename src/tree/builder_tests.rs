//! Tests for tree construction.

use super::*;
use std::fs;
use tempfile::TempDir;

// ===== Test Helpers =====

/// Create `files` (relative paths) under a fresh temp dir.
/// Returns the dir and the absolute paths of every created file.
fn layout(files: &[&str], dirs: &[&str]) -> (TempDir, HashSet<PathBuf>) {
    let dir = TempDir::new().expect("temp dir");
    for d in dirs {
        fs::create_dir_all(dir.path().join(d)).unwrap();
    }
    let mut created = HashSet::new();
    for f in files {
        let path = dir.path().join(f);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"log").unwrap();
        created.insert(path);
    }
    (dir, created)
}

fn child_names(tree: &FileTree, id: NodeId) -> Vec<String> {
    tree.get(id)
        .unwrap()
        .children()
        .iter()
        .map(|c| tree.get(*c).unwrap().name().to_string())
        .collect()
}

fn all_paths(tree: &FileTree) -> Vec<PathBuf> {
    tree.iter().map(|(_, n)| n.path().to_path_buf()).collect()
}

// ===== Scenarios =====

#[test]
fn scenario_sub_first_and_empty_pruned() {
    let (dir, valid) = layout(&["a.xlog", "sub/b.xlog"], &["empty"]);

    let tree = build(dir.path(), &valid);

    let root = tree.root();
    assert!(root.is_directory());
    assert_eq!(root.depth(), 0);
    assert_eq!(child_names(&tree, tree.root_id()), vec!["sub", "a.xlog"]);

    let sub = tree.find(&dir.path().join("sub")).unwrap();
    assert!(tree.get(sub).unwrap().is_directory());
    assert_eq!(child_names(&tree, sub), vec!["b.xlog"]);
    assert!(tree.find(&dir.path().join("empty")).is_none());
}

#[test]
fn root_name_is_its_absolute_path() {
    let (dir, valid) = layout(&["a.xlog"], &[]);
    let tree = build(dir.path(), &valid);
    assert_eq!(tree.root().name(), dir.path().display().to_string());
    assert_eq!(tree.root().path(), dir.path());
}

#[test]
fn empty_root_is_kept() {
    let (dir, valid) = layout(&[], &["empty", "also/empty"]);
    let tree = build(dir.path(), &valid);
    assert_eq!(tree.len(), 1);
    assert!(tree.root().children().is_empty());
}

#[test]
fn inaccessible_root_yields_bare_root() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("not-there");

    let tree = build(&missing, &HashSet::new());

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.root().path(), missing.as_path());
}

#[test]
fn root_only_matches_build_of_empty_directory() {
    let (dir, _) = layout(&[], &["empty"]);
    assert_eq!(root_only(dir.path()), build(dir.path(), &HashSet::new()));
}

// ===== File Filtering =====

#[test]
fn file_needs_both_extension_and_scanner_confirmation() {
    let (dir, mut valid) = layout(&["ok.xlog", "unconfirmed.xlog", "notes.txt"], &[]);
    valid.remove(&dir.path().join("unconfirmed.xlog"));

    let tree = build(dir.path(), &valid);

    assert_eq!(child_names(&tree, tree.root_id()), vec!["ok.xlog"]);
}

#[test]
fn extension_match_is_case_insensitive() {
    let (dir, valid) = layout(&["A.XLOG", "b.Mmap", "c.mmap2", "d.MMAP3"], &[]);
    let tree = build(dir.path(), &valid);
    assert_eq!(tree.file_count(), 4);
}

#[test]
fn directory_with_only_unconfirmed_files_is_pruned() {
    let (dir, _) = layout(&["keep/a.xlog", "drop/b.xlog"], &[]);
    let valid: HashSet<PathBuf> = [dir.path().join("keep/a.xlog")].into_iter().collect();

    let tree = build(dir.path(), &valid);

    assert_eq!(child_names(&tree, tree.root_id()), vec!["keep"]);
}

#[test]
fn chain_of_directories_survives_when_leaf_has_file() {
    let (dir, valid) = layout(&["x/y/z/deep.mmap3"], &[]);
    let tree = build(dir.path(), &valid);

    let z = tree.find(&dir.path().join("x/y/z")).unwrap();
    assert_eq!(tree.get(z).unwrap().depth(), 3);
    let file = tree.find(&dir.path().join("x/y/z/deep.mmap3")).unwrap();
    assert_eq!(tree.get(file).unwrap().depth(), 4);
}

// ===== Ordering =====

#[test]
fn directories_first_then_names() {
    let (dir, valid) = layout(
        &["b.xlog", "a.xlog", "zeta/1.xlog", "alpha/1.xlog", "C.xlog"],
        &[],
    );
    let tree = build(dir.path(), &valid);
    assert_eq!(
        child_names(&tree, tree.root_id()),
        vec!["alpha", "zeta", "C.xlog", "a.xlog", "b.xlog"]
    );
}

#[test]
fn build_is_deterministic() {
    let (dir, valid) = layout(
        &["m/1.xlog", "m/2.mmap", "a/b/c.xlog", "z.mmap2", "y.xlog"],
        &["empty"],
    );
    let first = build(dir.path(), &valid);
    let second = build(dir.path(), &valid);
    assert_eq!(first, second);
    assert_eq!(all_paths(&first), all_paths(&second));
}

// ===== Depth Ceiling =====

fn nested(levels: usize) -> String {
    (1..=levels)
        .map(|i| format!("d{i}"))
        .collect::<Vec<_>>()
        .join("/")
}

#[test]
fn file_at_max_depth_is_kept() {
    // Directory at depth MAX_DEPTH - 1 puts its file at exactly MAX_DEPTH.
    let file = format!("{}/leaf.xlog", nested(MAX_DEPTH - 1));
    let (dir, valid) = layout(&[file.as_str()], &[]);

    let tree = build(dir.path(), &valid);

    let id = tree.find(&dir.path().join(&file)).expect("file kept");
    assert_eq!(tree.get(id).unwrap().depth(), MAX_DEPTH);
}

#[test]
fn nodes_past_max_depth_are_dropped() {
    let file = format!("{}/leaf.xlog", nested(MAX_DEPTH));
    let (dir, valid) = layout(&[file.as_str()], &[]);

    let tree = build(dir.path(), &valid);

    assert_eq!(tree.len(), 1, "whole chain pruned once its only file is too deep");
    assert!(tree.iter().all(|(_, n)| n.depth() <= MAX_DEPTH));
}

#[test]
fn too_deep_branch_does_not_affect_siblings() {
    let deep = format!("{}/leaf.xlog", nested(MAX_DEPTH + 3));
    let (dir, valid) = layout(&[deep.as_str(), "shallow.xlog"], &[]);

    let tree = build(dir.path(), &valid);

    assert_eq!(child_names(&tree, tree.root_id()), vec!["shallow.xlog"]);
}

// ===== Symlinks =====

#[cfg(unix)]
#[test]
fn symlink_cycle_is_not_followed_forever() {
    let (dir, valid) = layout(&["a/one.xlog"], &[]);
    std::os::unix::fs::symlink(dir.path(), dir.path().join("a/loop")).unwrap();

    let tree = build(dir.path(), &valid);

    assert!(tree.find(&dir.path().join("a/loop")).is_none());
    assert_eq!(tree.file_count(), 1);
}

#[cfg(unix)]
#[test]
fn linked_directory_is_entered_once() {
    let (dir, mut valid) = layout(&["real/one.xlog"], &[]);
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("zlink")).unwrap();
    valid.insert(dir.path().join("zlink/one.xlog"));

    let tree = build(dir.path(), &valid);

    // "real" sorts first and claims the canonical directory.
    assert_eq!(child_names(&tree, tree.root_id()), vec!["real"]);
}

#[cfg(unix)]
#[test]
fn scanner_and_builder_agree_on_symlinks() {
    use crate::source::xlog::fixtures;
    use crate::source::{LogScanner, WalkDirScanner};

    let dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    fs::write(
        outside.path().join("far.xlog"),
        fixtures::plain("[I][2026-01-01 +0.0 00:00:00.000][1, 1][T][m]x\n"),
    )
    .unwrap();
    std::os::unix::fs::symlink(outside.path().join("far.xlog"), dir.path().join("near.xlog")).unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

    let valid = WalkDirScanner::new().scan(dir.path()).unwrap();
    let tree = build(dir.path(), &valid);

    assert_eq!(child_names(&tree, tree.root_id()), vec!["linked", "near.xlog"]);
    assert!(tree.find(&dir.path().join("linked/far.xlog")).is_some());
}
