//! Level and free-text filtering of decoded records.
//!
//! The filtered view is a pure function of (records, minimum level, query).

use crate::model::{LogLevel, LogRecord};

/// Active filter inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    min_level: LogLevel,
    query: String,
    /// Lowercased query, cached; empty when the query is blank.
    needle: String,
}

impl LogFilter {
    /// Filter keeping records at `min_level` or above that match `query`.
    pub fn new(min_level: LogLevel, query: impl Into<String>) -> Self {
        let query = query.into();
        let needle = if query.trim().is_empty() {
            String::new()
        } else {
            query.to_lowercase()
        };
        Self {
            min_level,
            query,
            needle,
        }
    }

    /// Lowest level kept.
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// The query exactly as entered.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Same query, new level.
    pub fn with_level(&self, min_level: LogLevel) -> Self {
        Self::new(min_level, self.query.clone())
    }

    /// Same level, new query.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self::new(self.min_level, query)
    }

    /// True when the filter keeps every record.
    pub fn is_pass_through(&self) -> bool {
        self.min_level == LogLevel::Verbose && self.needle.is_empty()
    }

    /// Whether `record` passes both the level and the text test.
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.matches_level(record) && self.matches_text(record)
    }

    fn matches_level(&self, record: &LogRecord) -> bool {
        self.min_level == LogLevel::Verbose || record.level() >= self.min_level
    }

    fn matches_text(&self, record: &LogRecord) -> bool {
        self.needle.is_empty()
            || record.tag().to_lowercase().contains(&self.needle)
            || record.message().to_lowercase().contains(&self.needle)
    }

    /// Indices of the records that pass, in their original order.
    pub fn matching_indices(&self, records: &[LogRecord]) -> Vec<usize> {
        if self.is_pass_through() {
            return (0..records.len()).collect();
        }
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.matches(r))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Stable filter: records at or above `min_level` whose tag or message
/// contains `query` case-insensitively. A blank query matches everything.
pub fn filter<'a>(records: &'a [LogRecord], min_level: LogLevel, query: &str) -> Vec<&'a LogRecord> {
    let filter = LogFilter::new(min_level, query);
    records.iter().filter(|r| filter.matches(r)).collect()
}
