//! Recursive directory scanner backed by `walkdir`.

use super::{has_log_extension, has_xlog_header, LogScanner};
use crate::model::ScanError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Scans a directory tree for log files.
///
/// A file counts when it has a log extension and its first few KiB hold an
/// xlog block header. Symlinks are followed, the same way the tree builder
/// follows them; walkdir reports link cycles as entry errors, which are
/// skipped. Entries that cannot be read below the root are skipped with a
/// warning; only a failure on the root itself is an error.
#[derive(Debug, Clone, Default)]
pub struct WalkDirScanner {
    max_depth: Option<usize>,
}

impl WalkDirScanner {
    /// Scanner without a depth limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how deep the walk descends below the root.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }
}

impl LogScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<HashSet<PathBuf>, ScanError> {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }
        debug!(root = ?root, "Scanning for log files");

        let mut walker = WalkDir::new(&root).follow_links(true);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut found = HashSet::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(ScanError::Walk {
                        path: root.clone(),
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !has_log_extension(entry.path()) {
                continue;
            }
            match has_xlog_header(entry.path()) {
                Ok(true) => {
                    found.insert(entry.into_path());
                }
                Ok(false) => debug!(path = ?entry.path(), "Skipping file without xlog header"),
                Err(err) => warn!(path = ?entry.path(), error = %err, "Skipping unreadable log file"),
            }
        }

        debug!(root = ?root, count = found.len(), "Scan complete");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::xlog::fixtures;
    use std::fs;
    use tempfile::TempDir;

    const LINE: &str = "[I][2026-01-01 +0.0 00:00:00.000][1, 1][T][m]x\n";

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let block = fixtures::plain(LINE);
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("a.xlog"), &block).unwrap();
        fs::write(dir.path().join("notes.txt"), &block).unwrap();
        fs::write(dir.path().join("sub/b.MMAP3"), &block).unwrap();
        fs::write(dir.path().join("sub/deeper/c.mmap2"), &block).unwrap();
        dir
    }

    #[test]
    fn finds_log_files_recursively() {
        let dir = fixture();
        let found = WalkDirScanner::new().scan(dir.path()).unwrap();

        assert_eq!(found.len(), 3);
        assert!(found.contains(&dir.path().join("a.xlog")));
        assert!(found.contains(&dir.path().join("sub/b.MMAP3")));
        assert!(found.contains(&dir.path().join("sub/deeper/c.mmap2")));
    }

    #[test]
    fn ignores_non_log_files_and_directories() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join("looks.xlog")).unwrap();
        let found = WalkDirScanner::new().scan(dir.path()).unwrap();

        assert!(!found.contains(&dir.path().join("notes.txt")));
        assert!(!found.contains(&dir.path().join("looks.xlog")));
    }

    #[test]
    fn max_depth_limits_walk() {
        let dir = fixture();
        let found = WalkDirScanner::with_max_depth(1).scan(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains(&dir.path().join("a.xlog")));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = WalkDirScanner::new().scan(&missing);
        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
    }

    #[test]
    fn file_root_is_an_error() {
        let dir = fixture();
        let result = WalkDirScanner::new().scan(&dir.path().join("a.xlog"));
        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
    }

    #[test]
    fn files_without_xlog_header_are_skipped() {
        let dir = fixture();
        fs::write(dir.path().join("junk.xlog"), b"zz").unwrap();
        fs::write(dir.path().join("dump.mmap"), LINE).unwrap();

        let found = WalkDirScanner::new().scan(dir.path()).unwrap();

        assert_eq!(found.len(), 3);
        assert!(!found.contains(&dir.path().join("junk.xlog")));
        assert!(!found.contains(&dir.path().join("dump.mmap")));
    }

    #[test]
    fn encrypted_files_pass_the_header_check() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("locked.xlog"), fixtures::encrypted(LINE)).unwrap();

        let found = WalkDirScanner::new().scan(dir.path()).unwrap();
        assert!(found.contains(&dir.path().join("locked.xlog")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_and_directories_are_followed() {
        let dir = fixture();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("far.xlog"), fixtures::plain(LINE)).unwrap();
        std::os::unix::fs::symlink(outside.path().join("far.xlog"), dir.path().join("near.xlog"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

        let found = WalkDirScanner::new().scan(dir.path()).unwrap();

        assert!(found.contains(&dir.path().join("near.xlog")));
        assert!(found.contains(&dir.path().join("linked/far.xlog")));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_ends_the_walk() {
        let dir = fixture();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

        let found = WalkDirScanner::new().scan(dir.path()).unwrap();
        assert_eq!(found.len(), 3);
    }
}
