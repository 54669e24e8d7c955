//! External collaborators consumed by the sessions.
//!
//! The view-state engine never parses binary log formats itself. It talks to
//! four collaborators through the traits below:
//! - [`LogScanner`]: which files under a root are valid logs
//! - [`LogDecoder`]: decode one file (optionally with a key) into records
//! - [`LogExporter`]: write a decrypted plain-text copy of a file
//! - [`FilePicker`]: ask the user for a path (cancel is `None`, not an error)
//!
//! Reference implementations live in the submodules: a walkdir scanner that
//! checks block headers, a binary xlog decoder, a text exporter, and a preset
//! picker for non-interactive use.

use crate::model::{DecodeError, ExportError, LogRecord, ScanError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub mod export;
pub mod picker;
pub mod scanner;
pub mod text;
pub mod xlog;

pub use export::TextExporter;
pub use picker::PresetPicker;
pub use scanner::WalkDirScanner;
pub use text::parse_line;
pub use xlog::{has_xlog_header, XlogDecoder};

/// File extensions recognized as xlog/mmap logs (compared case-insensitively).
pub const LOG_EXTENSIONS: [&str; 4] = ["xlog", "mmap", "mmap2", "mmap3"];

/// Check whether `path` carries one of [`LOG_EXTENSIONS`].
pub fn has_log_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| LOG_EXTENSIONS.contains(&ext.as_str()))
}

/// Finds valid log files under a directory.
pub trait LogScanner: Send + Sync {
    /// Return the absolute paths of every valid log file under `root`, recursively.
    ///
    /// # Errors
    ///
    /// Returns `ScanError` if the root is missing or the walk fails.
    fn scan(&self, root: &Path) -> Result<HashSet<PathBuf>, ScanError>;
}

/// Decodes a log file into ordered records.
pub trait LogDecoder: Send + Sync {
    /// # Errors
    ///
    /// Returns `DecodeError` for a missing file, a wrong key, or corrupt content.
    fn decode(&self, path: &Path, key: Option<&str>) -> Result<Vec<LogRecord>, DecodeError>;
}

/// Writes a decrypted plain-text copy of a log file.
pub trait LogExporter: Send + Sync {
    /// # Errors
    ///
    /// Any `ExportError` means the output must not be trusted.
    fn export(&self, input: &Path, output: &Path, key: Option<&str>) -> Result<(), ExportError>;
}

/// User-facing path selection. `None` means the user cancelled.
pub trait FilePicker {
    /// Ask for a log file to open.
    fn pick_file(&self) -> Option<PathBuf>;
    /// Ask for a directory to browse.
    fn pick_directory(&self) -> Option<PathBuf>;
    /// Ask where to save an export, suggesting `default_name`.
    fn pick_save_target(&self, default_name: &str) -> Option<PathBuf>;
}
