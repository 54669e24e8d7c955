//! Domain model types (pure).
//!
//! All types in this module are plain data with smart constructors.

pub mod error;
pub mod file_node;
pub mod log_record;

// Re-export for convenience
pub use error::{AppError, DecodeError, ExportError, ScanError};
pub use file_node::{FileNode, FileTree, NodeId};
pub use log_record::{epoch, LogLevel, LogRecord, UnknownLevel};
