//! xlog viewer (xlogview)
//!
//! View-state engine for browsing directories of xlog/mmap log files:
//! a pruned, sorted directory tree, a log session with level/text filtering
//! and an in-memory decryption key set, and the synchronization that keeps
//! the tree pointed at whatever file is open.
//!
//! The core (`tree`, `state`) is pure; collaborators that touch files live
//! behind the traits in `source`, and `workspace` ties everything together.

pub mod config;
pub mod logging;
pub mod model;
pub mod render;
pub mod source;
pub mod state;
pub mod tree;
pub mod workspace;

pub use workspace::{Collaborators, Dispatch, Workspace};
