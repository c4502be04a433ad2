//! Reports over HotSpot compilation logs.
//!
//! Every report is a deterministic fold over a fully read, time-ordered
//! event log. The analyses never mutate the events and keep no state between
//! logs, so one log's failure cannot affect the next.
//!
//! ## Reports
//!
//! - [`compile_queue`]: per-tier compile queue occupancy after each task
//!   transition, accounting for tasks demoted while they waited
//! - [`eliminated_locks`]: lock sites removed from each compilation
//! - [`statistics`]: compile time, phase totals, code cache use and the
//!   register allocation retry histogram
//! - [`recompilations`]: uncommon traps grouped by method and cause
//! - [`plain`]: every event on its own line, optionally with inlining trees
//!
//! ## Usage
//!
//! ```no_run
//! use jitlog_report::{ReportKind, ReportOptions, run};
//! use jitlog_source::{EventSource, JsonLinesSource};
//!
//! let events = JsonLinesSource::open("hotspot.jsonl", false)
//!     .unwrap()
//!     .read_events()
//!     .unwrap();
//! let kind = ReportKind::select(true, false, false, false);
//! run(&events, kind, &ReportOptions::default(), std::io::stdout().lock())
//!     .unwrap();
//! ```

mod error;
mod locks;
mod plain;
mod queue;
mod recompile;
mod sort;
mod statistics;
#[cfg(test)]
mod testutil;

use std::io::Write;

use jitlog_schemas::LogEvent;
use tracing::debug_span;

#[doc(inline)]
pub use crate::error::ReportError;
pub use crate::locks::{EliminatedLocksReport, eliminated_locks};
pub use crate::plain::{PlainReport, plain};
pub use crate::queue::{
    CompileQueueReport, Demotion, MAX_LEVEL, MIN_LEVEL, QueueSnapshot,
    QueueTracker, compile_queue,
};
pub use crate::recompile::{RecompilationReport, TrapGroup, recompilations};
pub use crate::sort::{SortOrder, sorted};
pub use crate::statistics::{
    CompilationStatistics, CompileTime, MAX_ATTEMPTS, PhaseTotals,
    StatisticsAggregator, statistics,
};

/// Which report to produce for a log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportKind {
    CompileQueue,
    EliminatedLocks,
    Statistics,
    Recompilation,
    #[default]
    Plain,
}

impl ReportKind {
    /// Picks one report from the requested ones.
    ///
    /// Precedence is queue, then locks, then statistics, then
    /// recompilation; with none requested the plain report is used.
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn select(
        queue: bool,
        locks: bool,
        statistics: bool,
        recompilation: bool,
    ) -> Self {
        if queue {
            Self::CompileQueue
        } else if locks {
            Self::EliminatedLocks
        } else if statistics {
            Self::Statistics
        } else if recompilation {
            Self::Recompilation
        } else {
            Self::Plain
        }
    }
}

/// Settings for the per-event reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportOptions {
    pub order: SortOrder,
    /// Expand inlining decisions under each compilation.
    pub print_inlining: bool,
}

/// Runs one report over a log and writes it to `output`.
///
/// Nothing is written if the log breaks an analysis invariant.
///
/// # Errors
///
/// Returns [`ReportError`] if:
/// - The log breaks an analysis invariant
///   ([`ReportError::is_invariant_violation`])
/// - Writing to output fails ([`ReportError::is_io`])
pub fn run(
    events: &[LogEvent],
    kind: ReportKind,
    options: &ReportOptions,
    mut output: impl Write,
) -> Result<(), ReportError> {
    let _span = debug_span!("run", ?kind, events = events.len()).entered();

    match kind {
        ReportKind::CompileQueue => {
            compile_queue(events)?.write_report(&mut output)?;
        }
        ReportKind::EliminatedLocks => {
            eliminated_locks(events, options.order).write_report(&mut output)?;
        }
        ReportKind::Statistics => {
            statistics(events)?.write_report(&mut output)?;
        }
        ReportKind::Recompilation => {
            recompilations(events).write_report(&mut output)?;
        }
        ReportKind::Plain => {
            plain(events, options.order, options.print_inlining)
                .write_report(&mut output)?;
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{enqueue, finish};

    #[test]
    fn select_follows_precedence() {
        assert_eq!(
            ReportKind::select(true, true, true, true),
            ReportKind::CompileQueue
        );
        assert_eq!(
            ReportKind::select(false, true, true, true),
            ReportKind::EliminatedLocks
        );
        assert_eq!(
            ReportKind::select(false, false, true, true),
            ReportKind::Statistics
        );
        assert_eq!(
            ReportKind::select(false, false, false, true),
            ReportKind::Recompilation
        );
        assert_eq!(
            ReportKind::select(false, false, false, false),
            ReportKind::Plain
        );
    }

    #[test]
    fn invariant_violation_writes_nothing() {
        let events = vec![enqueue("1", 2, 0.0), enqueue("1", 2, 0.5)];
        let mut out = Vec::new();
        let err = run(
            &events,
            ReportKind::CompileQueue,
            &ReportOptions::default(),
            &mut out,
        )
        .unwrap_err();

        assert!(err.is_invariant_violation());
        assert!(out.is_empty());
    }

    #[test]
    fn plain_report_skips_queue_events() {
        let events = vec![enqueue("1", 2, 0.0), finish("1", 2, 0.5)];
        let mut out = Vec::new();
        run(&events, ReportKind::Plain, &ReportOptions::default(), &mut out)
            .expect("plain report");
        assert!(out.is_empty());
    }
}
