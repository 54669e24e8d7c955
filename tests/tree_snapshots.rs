//! Snapshot tests for rendered tree rows.

mod common;

use common::{plain_log, write_file, LogDir, LINES};
use xlogview::render;

/// Rendered rows below the root, with the root's own indent removed so the
/// snapshot does not depend on the temporary directory name.
fn rows_below_root(ws: &xlogview::Workspace) -> String {
    let state = ws.tree_state();
    render::tree_lines(&state)
        .iter()
        .skip(1)
        .map(|line| line.strip_prefix("  ").unwrap_or(line.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn collapsed_tree_rows() {
    let dir = LogDir::new();
    let mut ws = dir.workspace();
    ws.open_directory(&dir.path("root"));

    insta::assert_snapshot!(rows_below_root(&ws), @r"
sub/
a.xlog
");
}

#[test]
fn expanded_tree_rows_with_selection() {
    let dir = LogDir::new();
    write_file(&dir.path("root/sub/deep/c.mmap3"), plain_log(LINES));
    write_file(&dir.path("root/sub/A.xlog"), plain_log(LINES));
    let mut ws = dir.workspace();
    ws.open_directory(&dir.path("root"));
    ws.toggle_expand(&dir.path("root/sub"));
    ws.toggle_expand(&dir.path("root/sub/deep"));
    ws.open_file(&dir.path("root/sub/b.xlog"));

    insta::assert_snapshot!(rows_below_root(&ws), @r"
sub/
  deep/
    c.mmap3
  A.xlog
  b.xlog *
a.xlog
");
}
