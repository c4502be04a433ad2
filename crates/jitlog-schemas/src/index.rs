//! Compile-id lookup over a borrowed event log.

use std::collections::HashMap;

use crate::event::{Compilation, LogEvent};

/// Resolves compile ids to the compilation that carries them.
///
/// Traps, nmethods and invalidations refer back to their compilation by id
/// only. The index borrows the log; if a log repeats a compile id the first
/// compilation wins.
#[derive(Debug, Default)]
pub struct EventIndex<'a> {
    compilations: HashMap<&'a str, &'a Compilation>,
}

impl<'a> EventIndex<'a> {
    pub fn new(events: &'a [LogEvent]) -> Self {
        let mut compilations = HashMap::new();
        for event in events {
            if let LogEvent::Compilation(c) = event {
                compilations.entry(c.id.as_str()).or_insert(c);
            }
        }
        Self { compilations }
    }

    /// Looks up the compilation with the given compile id.
    pub fn compilation(&self, id: &str) -> Option<&'a Compilation> {
        self.compilations.get(id).copied()
    }

    /// Returns the compilation an event belongs to.
    ///
    /// Compilations own themselves. Queue tasks and unrelated records have
    /// no owner.
    pub fn owning_compilation(
        &self,
        event: &'a LogEvent,
    ) -> Option<&'a Compilation> {
        match event {
            LogEvent::Compilation(c) => Some(c),
            LogEvent::NMethod(_)
            | LogEvent::MakeNotEntrant(_)
            | LogEvent::UncommonTrap(_) => {
                event.id().and_then(|id| self.compilation(id))
            }
            LogEvent::Task(_) | LogEvent::Other(_) => None,
        }
    }
}
