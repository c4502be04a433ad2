//! Compile queue occupancy over time.
//!
//! The compile broker keeps one queue per tier. Every task transition in the
//! log moves the per-level occupancy counts; this module replays those
//! transitions and emits one snapshot per transition.
//!
//! ## Demotion
//!
//! When the higher tiers are saturated, a waiting task can be re-tiered and
//! later leave the queue at a different level than the one it was enqueued
//! at. Occupancy is charged to the level the task actually waited in (its
//! enqueue level), otherwise the counts drift negative.

use std::collections::HashMap;
use std::io::Write;

use jitlog_schemas::{LogEvent, TaskEvent, TaskKind};
use tracing::{instrument, warn};

use crate::error::ReportError;

/// Lowest compile tier that has a queue.
pub const MIN_LEVEL: u8 = 1;
/// Highest compile tier.
pub const MAX_LEVEL: u8 = 4;

const LEVELS: usize = (MAX_LEVEL - MIN_LEVEL + 1) as usize;

/// A task that left the queue at a different tier than it entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Demotion {
    /// Level the task was enqueued (and counted) at.
    pub from: u8,
    /// Level the task left the queue at.
    pub to: u8,
}

/// Queue occupancy right after one task transition.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueSnapshot {
    pub stamp: f64,
    /// Occupancy of levels 1..=4, in order.
    pub counts: [i64; LEVELS],
    pub kind: TaskKind,
    pub comment: Option<String>,
    pub demotion: Option<Demotion>,
}

impl QueueSnapshot {
    /// Occupancy of a single level, or `None` for an unknown level.
    pub fn count(&self, level: u8) -> Option<i64> {
        slot(level).map(|i| self.counts[i])
    }
}

/// Replays task transitions and tracks per-level occupancy.
///
/// The tracker owns only ids and levels; it never holds on to events.
#[derive(Debug, Default)]
pub struct QueueTracker {
    /// Enqueue level of every task still waiting, by compile id.
    open: HashMap<String, u8>,
    counts: [i64; LEVELS],
    unmatched_exits: usize,
}

impl QueueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one transition and returns the resulting snapshot.
    ///
    /// A dequeue or finish without a matching open enqueue is logged and
    /// charged to its own level.
    pub fn observe(
        &mut self,
        task: &TaskEvent,
    ) -> Result<QueueSnapshot, ReportError> {
        let own = slot(task.level).ok_or_else(|| {
            ReportError::level_out_of_range(&task.id, task.level)
        })?;
        let mut demotion = None;

        match task.kind {
            TaskKind::Enqueue => {
                if self.open.contains_key(&task.id) {
                    return Err(ReportError::duplicate_enqueue(&task.id));
                }
                self.counts[own] += 1;
                self.open.insert(task.id.clone(), task.level);
            }
            TaskKind::Dequeue | TaskKind::Finish => {
                match self.open.remove(&task.id) {
                    Some(queued) if queued != task.level => {
                        // Enqueue levels were validated on the way in.
                        self.counts[usize::from(queued - MIN_LEVEL)] -= 1;
                        demotion = Some(Demotion {
                            from: queued,
                            to: task.level,
                        });
                    }
                    Some(_) => self.counts[own] -= 1,
                    None => {
                        warn!(
                            id = %task.id,
                            kind = %task.kind,
                            level = task.level,
                            stamp = task.start,
                            "task left the queue without a matching enqueue"
                        );
                        self.unmatched_exits += 1;
                        self.counts[own] -= 1;
                    }
                }
            }
        }

        Ok(QueueSnapshot {
            stamp: task.start,
            counts: self.counts,
            kind: task.kind,
            comment: task.comment.clone(),
            demotion,
        })
    }

    /// Current occupancy of levels 1..=4.
    pub fn counts(&self) -> [i64; LEVELS] {
        self.counts
    }

    /// Number of tasks currently waiting.
    pub fn open_tasks(&self) -> usize {
        self.open.len()
    }

    /// Dequeue/finish events seen without an open enqueue.
    pub fn unmatched_exits(&self) -> usize {
        self.unmatched_exits
    }
}

/// Occupancy snapshots for a whole log.
#[derive(Clone, Debug, Default)]
pub struct CompileQueueReport {
    /// One row per task event, in log order.
    pub rows: Vec<QueueSnapshot>,
    /// Occupancy after the last transition.
    pub final_counts: [i64; LEVELS],
    /// Tasks still queued when the log ended.
    pub still_queued: usize,
    pub unmatched_exits: usize,
}

impl CompileQueueReport {
    /// Writes the occupancy table.
    pub fn write_report(&self, mut w: impl Write) -> std::io::Result<()> {
        write!(w, "{:>7} ", "Stamp")?;
        for level in MIN_LEVEL..=MAX_LEVEL {
            write!(w, " Level{level}")?;
        }
        writeln!(w, "   {:>10}", "Kind")?;

        for row in &self.rows {
            write!(w, "{:7.3} ", row.stamp)?;
            for count in row.counts {
                write!(w, " {count:6}")?;
            }
            write!(w, "   {:>10}", row.kind)?;
            if let Some(comment) = &row.comment {
                write!(w, " {comment}")?;
            }
            if let Some(Demotion { from, to }) = row.demotion {
                write!(w, "  {from}->{to}")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

/// Replays every task event of a log through a fresh [`QueueTracker`].
///
/// Non-task events are skipped. Events must be in non-decreasing time order.
#[instrument(level = "debug", skip_all, fields(events = events.len()))]
pub fn compile_queue(
    events: &[LogEvent],
) -> Result<CompileQueueReport, ReportError> {
    let mut tracker = QueueTracker::new();
    let rows = events
        .iter()
        .filter_map(|event| match event {
            LogEvent::Task(task) => Some(tracker.observe(task)),
            _ => None,
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompileQueueReport {
        rows,
        final_counts: tracker.counts(),
        still_queued: tracker.open_tasks(),
        unmatched_exits: tracker.unmatched_exits(),
    })
}

/// Maps a compile level to its index in the counts array.
fn slot(level: u8) -> Option<usize> {
    (MIN_LEVEL..=MAX_LEVEL)
        .contains(&level)
        .then(|| usize::from(level - MIN_LEVEL))
}
