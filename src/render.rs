//! Plain-text rendering of session state for the CLI.

use crate::model::LogRecord;
use crate::state::{TreeState, VisibleNode};

/// Timestamp layout used in rendered record lines.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

/// One visible tree row: two spaces of indent per level, directories end
/// with `/`, the selected file is marked with `*`.
pub fn tree_line(row: &VisibleNode<'_>, state: &TreeState) -> String {
    let node = row.node;
    let indent = "  ".repeat(node.depth());
    let suffix = if node.is_directory() { "/" } else { "" };
    let marker = if state.selected() == Some(node.path()) { " *" } else { "" };
    format!("{indent}{}{suffix}{marker}", node.name())
}

/// Every visible row of `state`, in display order.
pub fn tree_lines(state: &TreeState) -> Vec<String> {
    state.flatten().map(|row| tree_line(&row, state)).collect()
}

/// `2024-03-01 09:00:01.000 +08:00 I [100/2] Net: GET /status`
pub fn record_line(record: &LogRecord) -> String {
    format!(
        "{} {} [{}/{}] {}: {}",
        record.timestamp().format(TIME_FORMAT),
        record.level(),
        record.process_id(),
        record.thread_id(),
        record.tag(),
        record.message()
    )
}
