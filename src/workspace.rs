//! Coordinating context for the two sessions.
//!
//! The `Workspace` is the single owner of [`TreeSession`] and [`LogSession`].
//! UI actions call its methods from one thread; collaborator calls either run
//! inline or on short-lived worker threads whose results come back over a
//! channel and are applied by [`Workspace::poll`] / [`Workspace::wait_idle`].
//! After every change of the active log file the tree is brought in line via
//! [`SyncController`].

use crate::model::{DecodeError, ExportError, LogLevel, ScanError};
use crate::source::{
    FilePicker, LogDecoder, LogExporter, LogScanner, TextExporter, WalkDirScanner, XlogDecoder,
};
use crate::state::{
    DecodeOutcome, DecodeRequest, ExportOutcome, ExportRequest, Flatten, LogSession, LogViewState,
    ScanOutcome, ScanRequest, SyncController, TreeSession, TreeState,
};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, warn};

// ===== Collaborators =====

/// External services the sessions depend on.
pub struct Collaborators {
    /// Finds valid log files for tree loads.
    pub scanner: Arc<dyn LogScanner>,
    /// Decodes the active log file.
    pub decoder: Arc<dyn LogDecoder>,
    /// Writes decrypted copies.
    pub exporter: Arc<dyn LogExporter>,
    /// Asks the user for paths.
    pub picker: Box<dyn FilePicker>,
}

impl Collaborators {
    /// Walkdir scanner, xlog decoder, text exporter over that decoder, and
    /// the given picker.
    pub fn reference(picker: impl FilePicker + 'static) -> Self {
        let decoder: Arc<dyn LogDecoder> = Arc::new(XlogDecoder::new());
        Self {
            scanner: Arc::new(WalkDirScanner::new()),
            exporter: Arc::new(TextExporter::new(Arc::clone(&decoder))),
            decoder,
            picker: Box::new(picker),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Where collaborator calls run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dispatch {
    /// On the calling thread, applied before the method returns.
    #[default]
    Inline,
    /// On a worker thread; applied by `poll` or `wait_idle`.
    Background,
}

enum Completion {
    Scan(ScanOutcome),
    Decode(DecodeOutcome),
    Export(ExportOutcome),
}

/// Run one collaborator call; a panic inside it becomes `fallback()`.
fn guarded<T>(kind: &'static str, call: impl FnOnce() -> T, fallback: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(value) => value,
        Err(_) => {
            error!(kind, "Collaborator panicked, reporting failure");
            fallback()
        }
    }
}

// ===== Workspace =====

/// Owner of both sessions and the collaborators they call.
pub struct Workspace {
    tree: TreeSession,
    log: LogSession,
    collaborators: Collaborators,
    dispatch: Dispatch,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: usize,
    /// Active file the tree was last synced to.
    synced_file: Option<PathBuf>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("tree", &self.tree)
            .field("log", &self.log)
            .field("dispatch", &self.dispatch)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Create a workspace with empty sessions.
    pub fn new(collaborators: Collaborators, dispatch: Dispatch) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tree: TreeSession::new(),
            log: LogSession::new(),
            collaborators,
            dispatch,
            tx,
            rx,
            in_flight: 0,
            synced_file: None,
        }
    }

    /// Where collaborator calls run.
    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    // ----- Read access -----

    /// The directory tree session.
    pub fn tree(&self) -> &TreeSession {
        &self.tree
    }

    /// The log view session.
    pub fn log(&self) -> &LogSession {
        &self.log
    }

    /// Shared snapshot of the current tree state.
    pub fn tree_state(&self) -> Arc<TreeState> {
        self.tree.snapshot()
    }

    /// Shared snapshot of the current log view state.
    pub fn log_state(&self) -> Arc<LogViewState> {
        self.log.snapshot()
    }

    /// Receive every later tree state change.
    pub fn subscribe_tree(&mut self) -> Receiver<Arc<TreeState>> {
        self.tree.subscribe()
    }

    /// Receive every later log view state change.
    pub fn subscribe_log(&mut self) -> Receiver<Arc<LogViewState>> {
        self.log.subscribe()
    }

    /// Visible tree rows in display order.
    pub fn flatten_tree(&self) -> Flatten<'_> {
        self.tree.state().flatten()
    }

    /// Number of collaborator calls dispatched but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    // ----- Tree actions -----

    /// Load `path` as the tree root.
    pub fn open_directory(&mut self, path: &Path) {
        let request = self.tree.begin_load(path);
        self.dispatch_scan(request);
    }

    /// Ask the picker for a directory and open it. Returns `false` on cancel.
    pub fn pick_directory(&mut self) -> bool {
        match self.collaborators.picker.pick_directory() {
            Some(path) => {
                self.open_directory(&path);
                true
            }
            None => false,
        }
    }

    /// Flip the expand flag of a directory row. `false` when nothing changed.
    pub fn toggle_expand(&mut self, path: &Path) -> bool {
        self.tree.toggle_expand(path)
    }

    /// Highlight `path` in the tree without decoding it.
    pub fn select_file(&mut self, path: &Path) {
        self.tree.select_file(path);
    }

    // ----- Log actions -----

    /// Decode `path` with the currently selected key.
    pub fn open_file(&mut self, path: &Path) {
        self.load(path, None);
    }

    /// Decode `path` with `key`, which also becomes the selected key.
    pub fn open_file_with_key(&mut self, path: &Path, key: &str) {
        self.load(path, Some(key.to_string()));
    }

    /// Ask the picker for a file and open it. Returns `false` on cancel.
    pub fn pick_file(&mut self) -> bool {
        match self.collaborators.picker.pick_file() {
            Some(path) => {
                self.open_file(&path);
                true
            }
            None => false,
        }
    }

    fn load(&mut self, path: &Path, key: Option<String>) {
        let request = self.log.begin_load(path, key);
        self.sync_tree();
        self.dispatch_decode(request);
    }

    /// Export the active file to a path chosen through the picker.
    ///
    /// Returns `false` when there is no active file or the user cancelled.
    pub fn export_current_file(&mut self) -> bool {
        let Some(default_name) = self.log.default_export_name() else {
            return false;
        };
        let Some(output) = self.collaborators.picker.pick_save_target(&default_name) else {
            debug!(default_name = %default_name, "Export cancelled");
            return false;
        };
        match self.log.begin_export(output) {
            Some(request) => {
                self.dispatch_export(request);
                true
            }
            None => false,
        }
    }

    /// Show only records at `level` or above.
    pub fn set_filter_level(&mut self, level: LogLevel) {
        self.log.set_filter_level(level);
    }

    /// Case-insensitive search over tag and message; empty shows everything.
    pub fn set_search_text(&mut self, text: &str) {
        self.log.set_search_text(text);
    }

    /// Remember a decryption key. `false` for blanks and duplicates.
    pub fn add_key(&mut self, key: &str) -> bool {
        self.log.add_key(key)
    }

    /// Forget a key. If it was selected, the first remaining key takes over.
    pub fn remove_key(&mut self, key: &str) -> bool {
        self.log.remove_key(key)
    }

    /// Choose the key used by later opens and exports.
    pub fn select_key(&mut self, key: Option<&str>) {
        self.log.select_key(key);
    }

    // ----- Completions -----

    /// Apply every completion that has already arrived. Never blocks.
    ///
    /// Returns how many completions were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Block until every dispatched call has completed and been applied.
    pub fn wait_idle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv() {
                Ok(completion) => self.apply(completion),
                Err(_) => break,
            }
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Scan(outcome) => {
                self.tree.finish_load(outcome);
            }
            Completion::Decode(outcome) => {
                self.log.finish_load(outcome);
            }
            Completion::Export(outcome) => {
                self.log.finish_export(outcome);
            }
        }
    }

    fn sync_tree(&mut self) {
        let active = self.log.state().active_file().map(Path::to_path_buf);
        if active == self.synced_file {
            return;
        }
        let action = SyncController::plan(active.as_deref(), self.tree.state());
        self.synced_file = active;
        if let Some(request) = SyncController::apply(action, &mut self.tree) {
            self.dispatch_scan(request);
        }
    }

    // ----- Dispatch -----

    fn dispatch_scan(&mut self, request: ScanRequest) {
        let scanner = Arc::clone(&self.collaborators.scanner);
        self.run("scan", move || {
            let fallback = request.clone();
            let outcome = guarded("scan", || request.run(scanner.as_ref()), || {
                let path = fallback.root.clone();
                fallback.complete(Err(ScanError::Panicked { path }))
            });
            Completion::Scan(outcome)
        });
    }

    fn dispatch_decode(&mut self, request: DecodeRequest) {
        let decoder = Arc::clone(&self.collaborators.decoder);
        self.run("decode", move || {
            let fallback = request.clone();
            let outcome = guarded("decode", || request.run(decoder.as_ref()), || {
                let path = fallback.path.clone();
                fallback.complete(Err(DecodeError::Panicked { path }))
            });
            Completion::Decode(outcome)
        });
    }

    fn dispatch_export(&mut self, request: ExportRequest) {
        let exporter = Arc::clone(&self.collaborators.exporter);
        self.run("export", move || {
            let fallback = request.clone();
            let outcome = guarded("export", || request.run(exporter.as_ref()), || {
                fallback.complete(Err(ExportError::Panicked))
            });
            Completion::Export(outcome)
        });
    }

    fn run<F>(&mut self, kind: &'static str, job: F)
    where
        F: FnOnce() -> Completion + Send + 'static,
    {
        self.in_flight += 1;
        if self.dispatch == Dispatch::Inline {
            let completion = job();
            self.apply(completion);
            return;
        }

        // The job is moved into the closure; if spawning fails it is lost, so
        // keep a slot to run it here instead. Jobs never unwind (see
        // `guarded`), so the worker always sends.
        let job = Arc::new(Mutex::new(Some(job)));
        let worker_job = Arc::clone(&job);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("xlogview-{kind}"))
            .spawn(move || {
                let job = worker_job.lock().ok().and_then(|mut slot| slot.take());
                if let Some(job) = job {
                    // Receiver gone means the workspace was dropped.
                    let _ = tx.send(job());
                }
            });

        if let Err(err) = spawned {
            warn!(kind, error = %err, "Cannot spawn worker, running inline");
            let job = job.lock().ok().and_then(|mut slot| slot.take());
            match job {
                Some(job) => {
                    let completion = job();
                    self.apply(completion);
                }
                None => self.in_flight = self.in_flight.saturating_sub(1),
            }
        }
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
