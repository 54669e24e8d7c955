//! View state machines (pure).
//!
//! Both sessions own their state through an [`Observable`] and talk to the
//! outside world only through request/outcome pairs, so every transition is
//! testable without threads or a filesystem.

pub mod filter;
pub mod key_set;
pub mod log_session;
pub mod observable;
pub mod sync;
pub mod ticket;
pub mod tree_session;

// Re-export for convenience
pub use filter::{filter, LogFilter};
pub use key_set::DecryptionKeySet;
pub use log_session::{
    default_export_name, DecodeOutcome, DecodeRequest, ExportOutcome, ExportRequest, LogSession,
    LogViewState, EXPORT_FAILED,
};
pub use observable::Observable;
pub use sync::{SyncAction, SyncController};
pub use ticket::Ticket;
pub use tree_session::{Flatten, ScanOutcome, ScanRequest, TreeSession, TreeState, VisibleNode};
