//! xlog viewer - Entry Point

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use xlogview::config::ResolvedConfig;
use xlogview::model::{AppError, FileNode, LogLevel, LogRecord, ScanError};
use xlogview::render;
use xlogview::source::PresetPicker;
use xlogview::state::default_export_name;
use xlogview::{Collaborators, Dispatch, Workspace};

/// xlog viewer - browse, filter and export xlog/mmap logs
#[derive(Parser, Debug)]
#[command(name = "xlogview")]
#[command(version)]
#[command(about = "Browse, filter and export xlog/mmap log files")]
struct Args {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Run scans and decodes on worker threads
    #[arg(long, global = true)]
    pub background: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print the tree of log files under a directory
    Tree {
        /// Directory to scan (defaults to `start_directory` from config)
        dir: Option<PathBuf>,

        /// Expand every directory instead of only the root
        #[arg(long)]
        expand_all: bool,

        /// Print visible nodes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a log file and print its filtered records
    View {
        /// Log file to open
        file: PathBuf,

        /// Minimum level (verbose, debug, info, warning, error, fatal, none, or V/D/I/W/E/F)
        #[arg(short, long)]
        level: Option<LogLevel>,

        /// Case-insensitive text matched against tag and message
        #[arg(short, long)]
        search: Option<String>,

        /// Decryption key (32 hex digits)
        #[arg(short, long)]
        key: Option<String>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a decrypted plain-text copy of a log file
    Export {
        /// Log file to export
        file: PathBuf,

        /// Output path (defaults to `<stem>_decrypted.txt`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decryption key (32 hex digits)
        #[arg(short, long)]
        key: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xlogview: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let resolved = xlogview::config::resolve(args.config.clone())?;
        let level_override = match &args.command {
            Command::View { level, .. } => *level,
            _ => None,
        };
        let background_override = args.background.then_some(true);
        xlogview::config::apply_cli_overrides(resolved, level_override, background_override)
    };

    xlogview::logging::init(&config.log_file_path)?;
    info!(config = ?config, "Configuration loaded and resolved");

    match args.command {
        Command::Tree {
            dir,
            expand_all,
            json,
        } => run_tree(&config, dir, expand_all, json),
        Command::View {
            file,
            search,
            key,
            json,
            ..
        } => run_view(&config, &file, search.as_deref(), key.as_deref(), json),
        Command::Export { file, output, key } => run_export(&config, &file, output, key.as_deref()),
    }
}

fn workspace(config: &ResolvedConfig, picker: PresetPicker) -> Workspace {
    let dispatch = if config.background {
        Dispatch::Background
    } else {
        Dispatch::Inline
    };
    Workspace::new(Collaborators::reference(picker), dispatch)
}

fn run_tree(
    config: &ResolvedConfig,
    dir: Option<PathBuf>,
    expand_all: bool,
    json: bool,
) -> Result<(), AppError> {
    let dir = dir
        .or_else(|| config.start_directory.clone())
        .ok_or(AppError::NoDirectory)?;
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory { path: dir }.into());
    }

    let mut ws = workspace(config, PresetPicker::cancelled());
    ws.open_directory(&dir);
    ws.wait_idle();

    if expand_all {
        let collapsed: Vec<PathBuf> = ws
            .tree_state()
            .tree()
            .map(|tree| {
                tree.iter()
                    .filter(|(id, node)| node.is_directory() && *id != tree.root_id())
                    .map(|(_, node)| node.path().to_path_buf())
                    .collect()
            })
            .unwrap_or_default();
        for path in &collapsed {
            ws.toggle_expand(path);
        }
    }

    let state = ws.tree_state();
    let mut out = io::stdout().lock();
    if json {
        let nodes: Vec<&FileNode> = state.flatten().map(|row| row.node).collect();
        serde_json::to_writer_pretty(&mut out, &nodes)?;
        writeln!(out)?;
    } else {
        for line in render::tree_lines(&state) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn run_view(
    config: &ResolvedConfig,
    file: &Path,
    search: Option<&str>,
    key: Option<&str>,
    json: bool,
) -> Result<(), AppError> {
    let mut ws = workspace(config, PresetPicker::cancelled());
    ws.set_filter_level(config.default_level);
    if let Some(search) = search {
        ws.set_search_text(search);
    }
    if let Some(key) = key {
        ws.add_key(key);
    }

    ws.open_file(file);
    ws.wait_idle();

    let state = ws.log_state();
    if let Some(error) = state.error() {
        return Err(AppError::Decode(error.to_string()));
    }

    let mut out = io::stdout().lock();
    if json {
        let records: Vec<&LogRecord> = state.filtered().collect();
        serde_json::to_writer_pretty(&mut out, &records)?;
        writeln!(out)?;
    } else {
        for record in state.filtered() {
            writeln!(out, "{}", render::record_line(record))?;
        }
    }
    info!(
        shown = state.filtered_len(),
        total = state.records().len(),
        "Printed records"
    );
    Ok(())
}

fn run_export(
    config: &ResolvedConfig,
    file: &Path,
    output: Option<PathBuf>,
    key: Option<&str>,
) -> Result<(), AppError> {
    let target = output.unwrap_or_else(|| PathBuf::from(default_export_name(file)));
    let picker = PresetPicker {
        save_target: Some(target.clone()),
        ..PresetPicker::default()
    };
    let mut ws = workspace(config, picker);
    if let Some(key) = key {
        ws.add_key(key);
    }

    ws.open_file(file);
    ws.wait_idle();
    ws.export_current_file();
    ws.wait_idle();

    if let Some(error) = ws.log_state().error() {
        return Err(AppError::Export(error.to_string()));
    }
    println!("Exported to {}", target.display());
    Ok(())
}
