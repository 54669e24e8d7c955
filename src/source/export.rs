//! Plain-text export of decoded logs.

use super::{LogDecoder, LogExporter};
use crate::model::{ExportError, LogRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Exports any decodable log as one text line per record.
///
/// Output lines look like `[1770289565656] [2] [12464/2] [Tag] : message`
/// (epoch milliseconds, level index, pid/tid, tag, message).
#[derive(Clone)]
pub struct TextExporter {
    decoder: Arc<dyn LogDecoder>,
}

impl TextExporter {
    /// Export through `decoder`, which also receives the key.
    pub fn new(decoder: Arc<dyn LogDecoder>) -> Self {
        Self { decoder }
    }
}

impl std::fmt::Debug for TextExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExporter").finish_non_exhaustive()
    }
}

/// Render one record in export format (no trailing newline).
pub fn format_export_line(record: &LogRecord) -> String {
    format!(
        "[{}] [{}] [{}/{}] [{}] : {}",
        record.timestamp().timestamp_millis(),
        record.level().index(),
        record.process_id(),
        record.thread_id(),
        record.tag(),
        record.message()
    )
}

impl LogExporter for TextExporter {
    fn export(&self, input: &Path, output: &Path, key: Option<&str>) -> Result<(), ExportError> {
        let records = self.decoder.decode(input, key)?;
        if records.is_empty() {
            return Err(ExportError::NoRecords {
                path: input.to_path_buf(),
            });
        }

        let write_err = |source| ExportError::Write {
            path: output.to_path_buf(),
            source,
        };

        let mut writer = BufWriter::new(File::create(output).map_err(write_err)?);
        for record in &records {
            writeln!(writer, "{}", format_export_line(record)).map_err(write_err)?;
        }
        writer.flush().map_err(write_err)?;

        info!(input = ?input, output = ?output, count = records.len(), "Exported log");
        debug!(has_key = key.is_some(), "Export used key");
        Ok(())
    }
}
