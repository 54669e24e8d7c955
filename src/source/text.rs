//! Parser for decoded xlog text.
//!
//! Once an xlog/mmap block has been decrypted and decompressed, every entry
//! is a single line of the form:
//!
//! ```text
//! [I][2026-02-05 +8.0 19:06:05.656][12464, 2*][Tag][thread, func, line]message
//! ```
//!
//! The five bracket groups are level marker, local time with hour offset,
//! `pid, tid` (a trailing `*` marks the main thread), tag, and call-site
//! metadata. Everything after the fifth group is the message.

use crate::model::{epoch, LogLevel, LogRecord};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

const BRACKET_GROUPS: usize = 5;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse one xlog text line.
///
/// Returns `None` for lines that do not start with `[` or carry fewer than
/// five bracket groups (continuation lines, banners, garbage).
pub fn parse_line(line: &str) -> Option<LogRecord> {
    if !line.starts_with('[') {
        return None;
    }

    let mut parts: Vec<&str> = Vec::with_capacity(BRACKET_GROUPS);
    let mut open: Option<usize> = None;
    let mut message_start = 0;

    for (i, c) in line.char_indices() {
        match c {
            '[' => open = Some(i + 1),
            ']' => {
                if let Some(start) = open.take() {
                    parts.push(&line[start..i]);
                    message_start = i + 1;
                    if parts.len() == BRACKET_GROUPS {
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    if parts.len() < BRACKET_GROUPS {
        return None;
    }

    let level = LogLevel::from_marker(parts[0]);
    let timestamp = parse_timestamp(parts[1]).unwrap_or_else(epoch);
    let (pid, tid) = parse_ids(parts[2]);
    let message = line[message_start..].trim();

    Some(
        LogRecord::new(level, parts[3], message, timestamp)
            .with_ids(pid, tid)
            .with_raw(line),
    )
}

/// Parse `2026-02-05 +8.0 19:06:05.656`. The `+8.0` token is an hour offset
/// from UTC; without one the time is taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let mut offset_hours: Option<f64> = None;
    let mut rest: Vec<&str> = Vec::new();

    for token in raw.split_whitespace() {
        if token.starts_with('+') || token.starts_with('-') {
            offset_hours = token.parse::<f64>().ok();
        } else {
            rest.push(token);
        }
    }

    let naive = NaiveDateTime::parse_from_str(&rest.join(" "), TIME_FORMAT).ok()?;
    let seconds = (offset_hours.unwrap_or(0.0) * 3600.0).round() as i32;
    let offset = FixedOffset::east_opt(seconds)?;
    offset.from_local_datetime(&naive).single()
}

/// Parse `12464, 2*` into (pid, tid). Unparseable ids become 0.
fn parse_ids(raw: &str) -> (i64, i64) {
    let mut ids = raw.split(',').map(str::trim);
    let pid = ids.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let tid = ids
        .next()
        .and_then(|s| s.trim_end_matches('*').parse().ok())
        .unwrap_or(0);
    (pid, tid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SAMPLE: &str =
        "[I][2026-02-05 +8.0 19:06:05.656][12464, 2*][LoggerInitProvider][main, onCreate, 42]init done";

    #[test]
    fn parses_all_fields() {
        let record = parse_line(SAMPLE).expect("valid line");

        assert_eq!(record.level(), LogLevel::Info);
        assert_eq!(record.tag(), "LoggerInitProvider");
        assert_eq!(record.message(), "init done");
        assert_eq!(record.process_id(), 12464);
        assert_eq!(record.thread_id(), 2);
        assert_eq!(record.raw(), Some(SAMPLE));
    }

    #[test]
    fn timestamp_keeps_hour_offset() {
        let ts = parse_line(SAMPLE).unwrap().timestamp();

        assert_eq!(ts.offset().local_minus_utc(), 8 * 3600);
        assert_eq!((ts.year(), ts.month(), ts.day()), (2026, 2, 5));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (19, 6, 5));
        assert_eq!(ts.timestamp_subsec_millis(), 656);
    }

    #[test]
    fn half_hour_and_negative_offsets() {
        let india = parse_line("[D][2026-01-01 +5.5 00:00:00.000][1, 1][T][m]x").unwrap();
        assert_eq!(india.timestamp().offset().local_minus_utc(), 5 * 3600 + 1800);

        let west = parse_line("[D][2026-01-01 -5.0 00:00:00.000][1, 1][T][m]x").unwrap();
        assert_eq!(west.timestamp().offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn unparseable_time_falls_back_to_epoch() {
        let record = parse_line("[W][yesterday][1, 1][T][m]late").unwrap();
        assert_eq!(record.timestamp(), epoch());
        assert_eq!(record.level(), LogLevel::Warning);
    }

    #[test]
    fn message_may_contain_brackets() {
        let record = parse_line("[E][2026-01-01 +0.0 00:00:00.000][1, 1][Net][m]code [503] from [api]")
            .unwrap();
        assert_eq!(record.message(), "code [503] from [api]");
    }

    #[test]
    fn rejects_lines_with_too_few_groups() {
        assert!(parse_line("[I][2026-01-01][1, 1]only three").is_none());
        assert!(parse_line("plain text").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn bad_ids_become_zero() {
        let record = parse_line("[I][2026-01-01 +0.0 00:00:00.000][abc][T][m]x").unwrap();
        assert_eq!((record.process_id(), record.thread_id()), (0, 0));
    }
}
