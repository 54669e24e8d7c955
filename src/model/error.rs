//! Error types for xlogview.
//!
//! This module defines the error taxonomy using `thiserror`. Each external
//! collaborator (scanner, decoder, exporter) has its own error enum so the
//! sessions can convert failures into state at the boundary.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error used by the binary shell
//!   - [`ScanError`] - Directory walk failures (missing root, unreadable entries)
//!   - [`DecodeError`] - Log decoding failures (bad key, corrupt file, I/O)
//!   - [`ExportError`] - Plain-text export failures
//!   - [`ConfigError`](crate::config::ConfigError) - Config file read/parse failures
//!   - [`LoggingError`](crate::logging::LoggingError) - Tracing setup failures
//!
//! # Recovery Strategy
//!
//! Nothing below the binary shell is fatal. A [`ScanError`] degrades to an empty
//! tree, a [`DecodeError`] becomes the log session's error message while the
//! previously loaded records are retained, and an [`ExportError`] becomes a
//! generic "Export failed" message.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error for the CLI shell.
///
/// Domain errors convert via `From`, so the shell composes with `?`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Tracing could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Directory scan failed.
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    /// `tree` was run without a directory and none is configured.
    #[error("No directory given and no start_directory configured")]
    NoDirectory,

    /// Decoding the selected log file failed.
    ///
    /// Only surfaces here when the shell reports the session's error; the
    /// session itself never propagates it.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Export failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Writing CLI output failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Serializing CLI output to JSON failed.
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced while scanning a directory for valid log files.
///
/// **Recovery**: `TreeSession` swallows these and leaves the tree empty.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use xlogview::model::error::ScanError;
///
/// let err = ScanError::NotADirectory { path: PathBuf::from("/tmp/a.xlog") };
/// assert!(err.to_string().contains("/tmp/a.xlog"));
/// ```
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root does not exist or is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// The root that was requested.
        path: PathBuf,
    },

    /// Walking the directory failed part-way.
    #[error("Failed to walk {path}: {message}")]
    Walk {
        /// Entry that could not be read.
        path: PathBuf,
        /// Underlying walker message.
        message: String,
    },

    /// The scanner panicked; the walk result is lost.
    #[error("Scanner crashed while reading {path}")]
    Panicked {
        /// The root being scanned.
        path: PathBuf,
    },
}

/// Errors produced by a [`LogDecoder`](crate::source::LogDecoder).
///
/// **Recovery**: `LogSession` stores `to_string()` of the error as its
/// user-visible message and keeps the previously loaded records.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The log file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The supplied key could not decrypt the file.
    #[error("Decryption failed for {path}: wrong or missing key")]
    BadKey {
        /// Path that was being decoded.
        path: PathBuf,
    },

    /// The file content is not a recognizable log.
    #[error("Corrupt log file {path}: {reason}")]
    Corrupt {
        /// Path that was being decoded.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Generic I/O failure while reading.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The decoder panicked.
    #[error("Decoder crashed on {path}")]
    Panicked {
        /// Path that was being decoded.
        path: PathBuf,
    },
}

/// Errors produced by a [`LogExporter`](crate::source::LogExporter).
///
/// **Recovery**: `LogSession` replaces any of these with a generic
/// "Export failed" message. No partial output is considered valid.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Decoding the input produced no records, so nothing was written.
    #[error("No records decoded from {path}")]
    NoRecords {
        /// Input file path.
        path: PathBuf,
    },

    /// The exporter refused or reported failure without more detail.
    #[error("Exporter reported failure")]
    Rejected,

    /// Decoding the input failed.
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The exporter panicked; the output may be partial.
    #[error("Exporter crashed")]
    Panicked,

    /// Writing the output failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
