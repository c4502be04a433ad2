//! JSON Lines event source.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use jitlog_schemas::LogEvent;
use tracing::{debug, instrument, warn};

use crate::EventSource;
use crate::error::{SourceError, SourceErrorKind};

/// Reads one JSON-encoded [`LogEvent`] per line.
///
/// Blank lines and lines starting with `#` are ignored. In strict mode the
/// first bad line aborts the read; with cleanup enabled bad lines are logged
/// and dropped, which recovers logs truncated by a crashing VM.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    cleanup: bool,
}

impl<R: BufRead> JsonLinesSource<R> {
    /// Creates a strict source over a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            cleanup: false,
        }
    }

    /// Enables or disables lenient handling of malformed lines.
    #[must_use]
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Opens a log file.
    pub fn open(
        path: impl AsRef<Path>,
        cleanup: bool,
    ) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)).with_cleanup(cleanup))
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    #[instrument(level = "debug", skip(self), fields(cleanup = self.cleanup))]
    fn read_events(&mut self) -> Result<Vec<LogEvent>, SourceError> {
        let mut events = Vec::new();
        let mut skipped = 0usize;
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let line = if self.cleanup {
                String::from_utf8_lossy(&buf)
            } else {
                std::str::from_utf8(&buf)
                    .map_err(|e| {
                        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
                    })?
                    .into()
            };
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            match parse_line(text, line_no) {
                Ok(event) => events.push(event),
                Err(kind) if self.cleanup => {
                    warn!(
                        line = line_no,
                        error = %kind,
                        "skipping malformed event"
                    );
                    skipped += 1;
                }
                Err(kind) => return Err(SourceError::new(kind)),
            }
        }

        // Stable sort: events sharing a timestamp keep their file order.
        events.sort_by(|a, b| a.start().total_cmp(&b.start()));

        debug!(events = events.len(), skipped, "read compilation log");
        Ok(events)
    }
}

/// Parses and validates a single non-empty line.
fn parse_line(text: &str, line: usize) -> Result<LogEvent, SourceErrorKind> {
    let event: LogEvent = serde_json::from_str(text)
        .map_err(|source| SourceErrorKind::Malformed { line, source })?;
    let start = event.start();
    if !start.is_finite() || start < 0.0 {
        return Err(SourceErrorKind::InvalidTimestamp { line, start });
    }
    Ok(event)
}
