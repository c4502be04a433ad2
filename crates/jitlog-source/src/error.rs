//! Error types for the jitlog-source crate.

use std::backtrace::Backtrace;
use std::fmt;

/// Error type for reading a compilation log into events.
///
/// Any `SourceError` is fatal for the log being read; callers move on to the
/// next input. Lines skipped in cleanup mode never surface here.
#[derive(Debug)]
pub struct SourceError {
    kind: SourceErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods.
#[derive(Debug)]
pub(crate) enum SourceErrorKind {
    /// A line is not a valid JSON event.
    Malformed {
        line: usize,
        source: serde_json::Error,
    },
    /// An event carries a negative or non-finite timestamp.
    InvalidTimestamp { line: usize, start: f64 },
    /// I/O error when reading the input.
    Io(std::io::Error),
}

impl SourceError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: SourceErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Returns true if a line could not be parsed as an event.
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, SourceErrorKind::Malformed { .. })
    }

    /// Returns true if an event had an unusable timestamp.
    pub fn is_invalid_timestamp(&self) -> bool {
        matches!(self.kind, SourceErrorKind::InvalidTimestamp { .. })
    }

    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, SourceErrorKind::Io(_))
    }

    /// 1-based line number of the offending record, when known.
    pub fn line(&self) -> Option<usize> {
        match self.kind {
            SourceErrorKind::Malformed { line, .. }
            | SourceErrorKind::InvalidTimestamp { line, .. } => Some(line),
            SourceErrorKind::Io(_) => None,
        }
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceErrorKind::Malformed { line, source } => {
                write!(f, "malformed event on line {line}: {source}")
            }
            SourceErrorKind::InvalidTimestamp { line, start } => {
                write!(f, "invalid timestamp {start} on line {line}")
            }
            SourceErrorKind::Io(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Summary of what happened.
        writeln!(f, "{}", self.kind)?;

        // Backtrace (will be empty unless RUST_BACKTRACE is set).
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            SourceErrorKind::Malformed { source, .. } => Some(source),
            SourceErrorKind::InvalidTimestamp { .. } => None,
            SourceErrorKind::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        Self::new(SourceErrorKind::Io(err))
    }
}
