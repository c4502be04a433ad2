//! One line per event, with optional inlining trees.

use std::io::{self, Write};

use jitlog_schemas::{CallSite, Compilation, LogEvent};

use crate::sort::{SortOrder, sorted};

/// Events in report order, ready to print.
#[derive(Debug)]
pub struct PlainReport<'a> {
    events: Vec<&'a LogEvent>,
    print_inlining: bool,
}

impl PlainReport<'_> {
    /// Events that will be printed, in order.
    pub fn events(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter().copied()
    }

    pub fn write_report(&self, mut w: impl Write) -> io::Result<()> {
        for event in &self.events {
            write_event(&mut w, event, self.print_inlining)?;
        }
        Ok(())
    }
}

/// Orders a log for the plain report.
///
/// Queue tasks and code installs carry nothing worth a line of their own and
/// are left out.
pub fn plain(
    events: &[LogEvent],
    order: SortOrder,
    print_inlining: bool,
) -> PlainReport<'_> {
    let events = sorted(events, order)
        .into_iter()
        .filter(|event| {
            !matches!(event, LogEvent::Task(_) | LogEvent::NMethod(_))
        })
        .collect();
    PlainReport {
        events,
        print_inlining,
    }
}

/// Writes an event's timestamped line.
fn write_event(
    w: &mut impl Write,
    event: &LogEvent,
    print_inlining: bool,
) -> io::Result<()> {
    write!(w, "{:.6} ", event.start())?;
    match event {
        LogEvent::Compilation(c) => write_compilation(w, c, print_inlining),
        LogEvent::MakeNotEntrant(mne) => {
            let zombie = if mne.zombie { " zombie" } else { "" };
            writeln!(w, "{} make_not_entrant{zombie}", mne.id)
        }
        LogEvent::UncommonTrap(trap) => {
            writeln!(w, "{} uncommon trap {}", trap.id, trap.format_trap())
        }
        LogEvent::NMethod(nm) => {
            writeln!(w, "{} nmethod {} bytes", nm.id, nm.size)
        }
        LogEvent::Task(task) => {
            writeln!(w, "{} {} level {}", task.id, task.kind, task.level)
        }
        LogEvent::Other(other) => match &other.id {
            Some(id) => writeln!(w, "{id} {}", other.name),
            None => writeln!(w, "{}", other.name),
        },
    }
}

/// Writes a compilation's description, failure and (optionally) the
/// decisions the inliner made.
pub(crate) fn write_compilation(
    w: &mut impl Write,
    c: &Compilation,
    print_inlining: bool,
) -> io::Result<()> {
    writeln!(w, "{}", c.short_description())?;
    if let Some(reason) = &c.failure {
        writeln!(w, "  COMPILE FAILED {reason}")?;
    }
    if print_inlining {
        for site in &c.inlining {
            write_call_site(w, site, 1)?;
        }
    }
    Ok(())
}

fn write_call_site(
    w: &mut impl Write,
    site: &CallSite,
    depth: usize,
) -> io::Result<()> {
    let indent = depth * 2;
    write!(w, "{:indent$}@ {} {}", "", site.bci, site.method)?;
    match (site.inlined, &site.reason) {
        (true, _) => writeln!(w, " (inlined)")?,
        (false, Some(reason)) => writeln!(w, " (not inlined: {reason})")?,
        (false, None) => writeln!(w, " (not inlined)")?,
    }
    for callee in &site.calls {
        write_call_site(w, callee, depth + 1)?;
    }
    Ok(())
}
