//! Decoded log records.
//!
//! LogRecord is one decoded line of xlog output. Records are immutable once
//! the decoder hands them over.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ===== LogLevel =====

/// Severity of a log record.
///
/// Ordering is meaningful: `Verbose < Debug < Info < Warning < Error < Fatal < None`.
/// The filter pipeline compares levels by this ordinal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most detailed; also the "show everything" filter level.
    #[default]
    Verbose,
    /// Debugging output.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected but recoverable.
    Warning,
    /// An operation failed.
    Error,
    /// The process cannot continue.
    Fatal,
    /// Marker level above every real record.
    None,
}

impl LogLevel {
    /// All levels in ascending order.
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Fatal,
        LogLevel::None,
    ];

    /// Parse the one-letter marker xlog writes in the first bracket group.
    ///
    /// Unknown markers map to `Info`, which is what the xlog tooling assumes
    /// for lines written by older SDKs.
    pub fn from_marker(marker: &str) -> Self {
        match marker.trim().to_ascii_uppercase().as_str() {
            "V" => LogLevel::Verbose,
            "D" => LogLevel::Debug,
            "I" => LogLevel::Info,
            "W" => LogLevel::Warning,
            "E" => LogLevel::Error,
            "F" => LogLevel::Fatal,
            _ => LogLevel::Info,
        }
    }

    /// Level for a numeric index as emitted by native decoders. Out of range maps to `Info`.
    pub fn from_index(index: i64) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(LogLevel::Info)
    }

    /// Ordinal index (`Verbose` = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-letter marker. `None` renders as `N`.
    pub fn marker(self) -> &'static str {
        match self {
            LogLevel::Verbose => "V",
            LogLevel::Debug => "D",
            LogLevel::Info => "I",
            LogLevel::Warning => "W",
            LogLevel::Error => "E",
            LogLevel::Fatal => "F",
            LogLevel::None => "N",
        }
    }

    /// Lowercase name, as accepted by `FromStr` and written by serde.
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::None => "none",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Returned when a level name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}' (expected verbose, debug, info, warning, error, fatal or none)")]
pub struct UnknownLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLevel;

    /// Accepts full names (case-insensitive), `warn`, and the one-letter markers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let level = match lower.as_str() {
            "verbose" | "v" => LogLevel::Verbose,
            "debug" | "d" => LogLevel::Debug,
            "info" | "i" => LogLevel::Info,
            "warning" | "warn" | "w" => LogLevel::Warning,
            "error" | "e" => LogLevel::Error,
            "fatal" | "f" => LogLevel::Fatal,
            "none" | "n" => LogLevel::None,
            _ => return Err(UnknownLevel(s.to_string())),
        };
        Ok(level)
    }
}

// ===== LogRecord =====

/// One decoded log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    level: LogLevel,
    tag: String,
    message: String,
    timestamp: DateTime<FixedOffset>,
    process_id: i64,
    thread_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
}

impl LogRecord {
    /// Create a record with zero process/thread ids and no raw line.
    pub fn new(
        level: LogLevel,
        tag: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            level,
            tag: tag.into(),
            message: message.into(),
            timestamp,
            process_id: 0,
            thread_id: 0,
            raw: None,
        }
    }

    /// Set process and thread ids.
    pub fn with_ids(mut self, process_id: i64, thread_id: i64) -> Self {
        self.process_id = process_id;
        self.thread_id = thread_id;
        self
    }

    /// Attach the source line this record was decoded from.
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    // ===== Accessors =====

    /// Severity.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Module tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Message text after the header groups.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Local time with its recorded UTC offset.
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Writing process id; 0 when unknown.
    pub fn process_id(&self) -> i64 {
        self.process_id
    }

    /// Writing thread id; 0 when unknown.
    pub fn thread_id(&self) -> i64 {
        self.thread_id
    }

    /// The line this record was parsed from, if kept.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

/// The Unix epoch at UTC, used when a line carries no parseable timestamp.
pub fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}
