//! Directory tree construction (pure apart from reading the filesystem).

pub mod builder;

pub use builder::{build, root_only, MAX_DEPTH};
