//! Log viewer session: active file, decoded records, filter, keys.
//!
//! Decoding and exporting follow the same request/outcome protocol as the
//! tree session. Loads and exports use separate ticket slots, so an export
//! never invalidates a load and vice versa; `loading` is true while either
//! is outstanding.

use super::filter::LogFilter;
use super::key_set::DecryptionKeySet;
use super::observable::Observable;
use super::ticket::{Ticket, TicketSlot};
use crate::model::{DecodeError, ExportError, LogLevel, LogRecord};
use crate::source::{LogDecoder, LogExporter};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Error shown when an export fails, whatever the cause.
pub const EXPORT_FAILED: &str = "Export failed";

/// Suffix appended to the input's stem to name an export.
pub const EXPORT_SUFFIX: &str = "_decrypted.txt";

/// Suggested output file name for exporting `input`: its stem plus
/// [`EXPORT_SUFFIX`], without any directory.
pub fn default_export_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string());
    format!("{stem}{EXPORT_SUFFIX}")
}

// ===== State =====

/// Snapshot of the log session.
///
/// The filtered view is derived from `records` and the filter and is
/// refreshed by every mutation touching either, so it cannot go stale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogViewState {
    active_file: Option<PathBuf>,
    loading: bool,
    error: Option<String>,
    records: Arc<[LogRecord]>,
    filter: LogFilter,
    keys: DecryptionKeySet,
    /// Indices into `records` passing `filter`.
    visible: Arc<[usize]>,
}

impl LogViewState {
    /// File of the most recent load request.
    pub fn active_file(&self) -> Option<&Path> {
        self.active_file.as_deref()
    }

    /// True while a decode or export is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failure, cleared by the next load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Every record of the last successful load.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Records passing the current filter, in original order.
    pub fn filtered(&self) -> impl Iterator<Item = &LogRecord> + '_ {
        self.visible.iter().filter_map(|&i| self.records.get(i))
    }

    /// Number of records passing the filter.
    pub fn filtered_len(&self) -> usize {
        self.visible.len()
    }

    /// Minimum level shown.
    pub fn filter_level(&self) -> LogLevel {
        self.filter.min_level()
    }

    /// Search text as entered.
    pub fn search_text(&self) -> &str {
        self.filter.query()
    }

    /// Known keys and the selected one.
    pub fn keys(&self) -> &DecryptionKeySet {
        &self.keys
    }

    fn refilter(&mut self) {
        self.visible = self.filter.matching_indices(&self.records).into();
    }
}

// ===== Requests =====

/// A decode to be performed. The key is fixed when the request is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    /// Orders this request against newer ones.
    pub ticket: Ticket,
    /// Absolute path to decode.
    pub path: PathBuf,
    /// Key to decode with.
    pub key: Option<String>,
}

impl DecodeRequest {
    /// Decode with `decoder`. Touches the filesystem.
    pub fn run(self, decoder: &dyn LogDecoder) -> DecodeOutcome {
        let result = decoder.decode(&self.path, self.key.as_deref());
        self.complete(result)
    }

    /// Pair this request with an already computed result.
    pub fn complete(self, result: Result<Vec<LogRecord>, DecodeError>) -> DecodeOutcome {
        DecodeOutcome {
            request: self,
            result,
        }
    }
}

/// A decode request with its result.
#[derive(Debug)]
pub struct DecodeOutcome {
    /// The request that produced `result`.
    pub request: DecodeRequest,
    /// Decoded records or the decoder's error.
    pub result: Result<Vec<LogRecord>, DecodeError>,
}

/// An export to be performed. The key is fixed when the request is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Orders this request against newer ones.
    pub ticket: Ticket,
    /// Log file to export.
    pub input: PathBuf,
    /// Destination path.
    pub output: PathBuf,
    /// Key to decode with.
    pub key: Option<String>,
}

impl ExportRequest {
    /// Export with `exporter`. Touches the filesystem.
    pub fn run(self, exporter: &dyn LogExporter) -> ExportOutcome {
        let result = exporter.export(&self.input, &self.output, self.key.as_deref());
        self.complete(result)
    }

    /// Pair this request with an already computed result.
    pub fn complete(self, result: Result<(), ExportError>) -> ExportOutcome {
        ExportOutcome {
            request: self,
            result,
        }
    }
}

/// An export request with its result.
#[derive(Debug)]
pub struct ExportOutcome {
    /// The request that produced `result`.
    pub request: ExportRequest,
    /// Success, or why the output cannot be trusted.
    pub result: Result<(), ExportError>,
}

// ===== Session =====

/// Active log file, its records, the filter, and the key set.
#[derive(Debug, Default)]
pub struct LogSession {
    state: Observable<LogViewState>,
    loads: TicketSlot,
    exports: TicketSlot,
}

impl LogSession {
    /// Session with no active file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, borrowed.
    pub fn state(&self) -> &LogViewState {
        self.state.get()
    }

    /// Current state as a shared snapshot.
    pub fn snapshot(&self) -> Arc<LogViewState> {
        self.state.snapshot()
    }

    /// Receive every later state change.
    pub fn subscribe(&mut self) -> Receiver<Arc<LogViewState>> {
        self.state.subscribe()
    }

    /// Whether a decode or export is outstanding.
    pub fn is_pending(&self) -> bool {
        self.loads.is_outstanding() || self.exports.is_outstanding()
    }

    // ----- Loading -----

    /// Start decoding `path`.
    ///
    /// `key` of `None` means "use the currently selected key". Whatever key
    /// is used becomes the selected key. The error is cleared; previously
    /// loaded records stay until the decode succeeds.
    pub fn begin_load(&mut self, path: &Path, key: Option<String>) -> DecodeRequest {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let key = key.or_else(|| self.state.get().keys.selected().map(str::to_string));
        let ticket = self.loads.issue();

        debug!(path = ?path, %ticket, has_key = key.is_some(), "Log load started");
        self.state.update(|s| {
            s.active_file = Some(path.clone());
            s.error = None;
            s.loading = true;
            s.keys.select(key.as_deref());
        });

        DecodeRequest { ticket, path, key }
    }

    /// Apply a finished decode. Returns `false` for stale outcomes, which are ignored.
    pub fn finish_load(&mut self, outcome: DecodeOutcome) -> bool {
        let DecodeOutcome { request, result } = outcome;
        if !self.loads.settle(request.ticket) {
            debug!(path = ?request.path, ticket = %request.ticket, "Discarding stale log load");
            return false;
        }

        let loading = self.is_pending();
        match result {
            Ok(records) => {
                info!(path = ?request.path, count = records.len(), "Log loaded");
                self.state.update(|s| {
                    s.records = records.into();
                    s.refilter();
                    s.error = None;
                    s.loading = loading;
                });
            }
            Err(err) => {
                warn!(path = ?request.path, error = %err, "Log decode failed");
                self.state.update(|s| {
                    s.error = Some(err.to_string());
                    s.loading = loading;
                });
            }
        }
        true
    }

    /// Decode `path` synchronously on the calling thread.
    pub fn load_file(&mut self, path: &Path, key: Option<String>, decoder: &dyn LogDecoder) {
        let request = self.begin_load(path, key);
        let outcome = request.run(decoder);
        self.finish_load(outcome);
    }

    // ----- Filtering -----

    /// Change the minimum level and refilter.
    pub fn set_filter_level(&mut self, level: LogLevel) {
        debug!(%level, "Filter level changed");
        self.state.update(|s| {
            s.filter = s.filter.with_level(level);
            s.refilter();
        });
    }

    /// Change the search text and refilter.
    pub fn set_search_text(&mut self, text: &str) {
        debug!(query = text, "Search text changed");
        self.state.update(|s| {
            s.filter = s.filter.with_query(text);
            s.refilter();
        });
    }

    // ----- Keys -----

    /// Add and select `key`. Blank and duplicate keys are ignored.
    pub fn add_key(&mut self, key: &str) -> bool {
        let added = self.state.update(|s| s.keys.add(key));
        if added {
            debug!(count = self.state.get().keys.len(), "Decryption key added");
        }
        added
    }

    /// Remove `key`. Returns `false` if it was unknown.
    pub fn remove_key(&mut self, key: &str) -> bool {
        self.state.update(|s| s.keys.remove(key))
    }

    /// Select `key` for later loads, or clear the selection.
    pub fn select_key(&mut self, key: Option<&str>) {
        self.state.update(|s| s.keys.select(key));
    }

    // ----- Export -----

    /// Suggested output name for the active file, if any.
    pub fn default_export_name(&self) -> Option<String> {
        self.state.get().active_file().map(default_export_name)
    }

    /// Start exporting the active file to `output` with the selected key.
    ///
    /// Returns `None` (and changes nothing) when no file is active.
    pub fn begin_export(&mut self, output: PathBuf) -> Option<ExportRequest> {
        let state = self.state.get();
        let input = state.active_file.clone()?;
        let key = state.keys.selected().map(str::to_string);
        let ticket = self.exports.issue();

        debug!(input = ?input, output = ?output, %ticket, "Export started");
        self.state.update(|s| s.loading = true);

        Some(ExportRequest {
            ticket,
            input,
            output,
            key,
        })
    }

    /// Apply a finished export. Failure sets a generic error, success clears it.
    pub fn finish_export(&mut self, outcome: ExportOutcome) -> bool {
        let ExportOutcome { request, result } = outcome;
        if !self.exports.settle(request.ticket) {
            debug!(output = ?request.output, ticket = %request.ticket, "Discarding stale export");
            return false;
        }

        let error = match result {
            Ok(()) => {
                info!(input = ?request.input, output = ?request.output, "Export finished");
                None
            }
            Err(err) => {
                warn!(input = ?request.input, output = ?request.output, error = %err, "Export failed");
                Some(EXPORT_FAILED.to_string())
            }
        };
        let loading = self.is_pending();
        self.state.update(|s| {
            s.error = error;
            s.loading = loading;
        });
        true
    }

    /// Export the active file synchronously. No-op without an active file.
    pub fn export_current_file(&mut self, output: PathBuf, exporter: &dyn LogExporter) {
        if let Some(request) = self.begin_export(output) {
            let outcome = request.run(exporter);
            self.finish_export(outcome);
        }
    }
}

#[cfg(test)]
#[path = "log_session_tests.rs"]
mod tests;
