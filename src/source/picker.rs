//! Non-interactive file picker.

use super::FilePicker;
use std::path::PathBuf;

/// A picker that answers with paths fixed up front.
///
/// Used by the CLI (paths come from arguments) and by tests. A `None` slot
/// behaves like the user cancelling the dialog. When no save target is set
/// the suggested default name is accepted as-is.
#[derive(Debug, Clone, Default)]
pub struct PresetPicker {
    /// Answer to `pick_file`.
    pub file: Option<PathBuf>,
    /// Answer to `pick_directory`.
    pub directory: Option<PathBuf>,
    /// Answer to `pick_save_target`.
    pub save_target: Option<PathBuf>,
    /// Without a save target, answer with the suggested name instead of cancelling.
    pub accept_default_name: bool,
}

impl PresetPicker {
    /// A picker where every dialog is cancelled.
    pub fn cancelled() -> Self {
        Self::default()
    }
}

impl FilePicker for PresetPicker {
    fn pick_file(&self) -> Option<PathBuf> {
        self.file.clone()
    }

    fn pick_directory(&self) -> Option<PathBuf> {
        self.directory.clone()
    }

    fn pick_save_target(&self, default_name: &str) -> Option<PathBuf> {
        match &self.save_target {
            Some(path) => Some(path.clone()),
            None if self.accept_default_name => Some(PathBuf::from(default_name)),
            None => None,
        }
    }
}
