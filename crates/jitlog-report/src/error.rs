//! Error types for the jitlog-report crate.

use std::backtrace::Backtrace;
use std::fmt;

/// Error type for report generation.
///
/// Every variant other than I/O is an invariant violation in the event
/// stream: the counts a report would print past that point are meaningless,
/// so analysis of the log stops. Recoverable oddities (a task leaving the
/// queue without an enqueue, a zombie for unknown code) are logged instead.
#[derive(Debug)]
pub struct ReportError {
    kind: ReportErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods.
#[derive(Debug)]
pub(crate) enum ReportErrorKind {
    /// A task was enqueued while an earlier enqueue of the same id is open.
    DuplicateEnqueue { id: String },
    /// A task event names a compile tier outside 1..=4.
    LevelOutOfRange { id: String, level: u8 },
    /// A compilation retried register allocation more often than the
    /// histogram can hold.
    AttemptsOutOfRange { id: String, attempts: u32 },
    /// I/O error when writing the report.
    Io(std::io::Error),
}

impl ReportError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: ReportErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    pub(crate) fn duplicate_enqueue(id: &str) -> Self {
        Self::new(ReportErrorKind::DuplicateEnqueue { id: id.to_owned() })
    }

    pub(crate) fn level_out_of_range(id: &str, level: u8) -> Self {
        Self::new(ReportErrorKind::LevelOutOfRange {
            id: id.to_owned(),
            level,
        })
    }

    pub(crate) fn attempts_out_of_range(id: &str, attempts: u32) -> Self {
        Self::new(ReportErrorKind::AttemptsOutOfRange {
            id: id.to_owned(),
            attempts,
        })
    }

    /// Returns true if a task id was enqueued twice without leaving the queue.
    pub fn is_duplicate_enqueue(&self) -> bool {
        matches!(self.kind, ReportErrorKind::DuplicateEnqueue { .. })
    }

    /// Returns true if a task event named an unknown compile tier.
    pub fn is_level_out_of_range(&self) -> bool {
        matches!(self.kind, ReportErrorKind::LevelOutOfRange { .. })
    }

    /// Returns true if a compilation's retry count exceeded the histogram.
    pub fn is_attempts_out_of_range(&self) -> bool {
        matches!(self.kind, ReportErrorKind::AttemptsOutOfRange { .. })
    }

    /// Returns true if the event stream broke an analysis invariant.
    pub fn is_invariant_violation(&self) -> bool {
        !self.is_io()
    }

    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ReportErrorKind::Io(_))
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for ReportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportErrorKind::DuplicateEnqueue { id } => {
                write!(
                    f,
                    "internal error: task {id} enqueued while still queued"
                )
            }
            ReportErrorKind::LevelOutOfRange { id, level } => {
                write!(
                    f,
                    "internal error: task {id} has compile level {level}, \
                     expected 1..=4"
                )
            }
            ReportErrorKind::AttemptsOutOfRange { id, attempts } => {
                write!(
                    f,
                    "internal error: compilation {id} made {attempts} \
                     register allocation attempts, at most 31 supported"
                )
            }
            ReportErrorKind::Io(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Summary of what happened.
        writeln!(f, "{}", self.kind)?;

        // Backtrace (will be empty unless RUST_BACKTRACE is set).
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ReportErrorKind::Io(err) => Some(err),
            ReportErrorKind::DuplicateEnqueue { .. }
            | ReportErrorKind::LevelOutOfRange { .. }
            | ReportErrorKind::AttemptsOutOfRange { .. } => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ReportErrorKind::Io(err))
    }
}
