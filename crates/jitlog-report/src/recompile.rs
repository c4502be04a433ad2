//! Uncommon traps grouped by method and cause.
//!
//! Repeated deoptimization for the same reason in the same method is what
//! drives recompilation storms. Groups are ranked by how many compilations
//! hit them; ties keep the order in which the groups were first seen so the
//! output is reproducible.

use std::io::Write;

use indexmap::IndexMap;
use itertools::Itertools;
use jitlog_schemas::{EventIndex, LogEvent};
use tracing::{instrument, warn};

/// Compilations that trapped in one method for one reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrapGroup {
    /// Display text of the trapping method, e.g. `a.B::f (20 bytes)`.
    /// Overloads that print the same share a group.
    pub method: String,
    /// Trimmed trap description.
    pub reason: String,
    /// Compile ids in the order their traps appeared.
    pub compile_ids: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct RecompilationReport {
    /// Groups ordered largest first.
    pub groups: Vec<TrapGroup>,
    /// Traps whose compilation is not in the log.
    pub orphaned_traps: usize,
}

impl RecompilationReport {
    pub fn write_report(&self, mut w: impl Write) -> std::io::Result<()> {
        for group in &self.groups {
            writeln!(w, "Trap: {}", group.reason)?;
            let ids = group.compile_ids.iter().join(", ");
            writeln!(w, "Compilations: [{ids}]")?;
        }
        Ok(())
    }
}

/// Groups every uncommon trap by (method, reason) and ranks the groups.
#[instrument(level = "debug", skip_all, fields(events = events.len()))]
pub fn recompilations(events: &[LogEvent]) -> RecompilationReport {
    let index = EventIndex::new(events);
    let mut by_method: IndexMap<String, IndexMap<String, Vec<String>>> =
        IndexMap::new();
    let mut orphaned_traps = 0;

    for event in events {
        let LogEvent::UncommonTrap(trap) = event else {
            continue;
        };
        let Some(compilation) = index.owning_compilation(event) else {
            warn!(
                id = %trap.id,
                stamp = trap.start,
                "uncommon trap for a compilation missing from the log"
            );
            orphaned_traps += 1;
            continue;
        };
        by_method
            .entry(compilation.method.to_string())
            .or_default()
            .entry(trap.format_trap())
            .or_default()
            .push(trap.id.clone());
    }

    let mut groups: Vec<TrapGroup> = by_method
        .into_iter()
        .flat_map(|(method, reasons)| {
            reasons.into_iter().map(move |(reason, compile_ids)| TrapGroup {
                method: method.clone(),
                reason,
                compile_ids,
            })
        })
        .collect();
    // Stable: equal-sized groups stay in discovery order.
    groups.sort_by(|a, b| b.compile_ids.len().cmp(&a.compile_ids.len()));

    RecompilationReport {
        groups,
        orphaned_traps,
    }
}
