//! Compile time, phase and code cache totals for one log.

use std::collections::HashMap;
use std::io::Write;

use indexmap::IndexMap;
use jitlog_schemas::{Compilation, LogEvent};
use tracing::{instrument, warn};

use crate::error::ReportError;

/// Size of the register allocation retry histogram.
pub const MAX_ATTEMPTS: usize = 32;

/// Cumulative time and node counts for one phase name.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseTotals {
    pub elapsed: f64,
    pub nodes: u64,
}

/// Elapsed time of a single compilation, in log order.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileTime {
    pub description: String,
    pub elapsed: f64,
}

/// Totals produced by [`StatisticsAggregator::finish`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompilationStatistics {
    pub compilations: Vec<CompileTime>,
    /// Sum of elapsed time across all compilations.
    pub total_elapsed: f64,
    /// Phase totals keyed by phase name, in first-seen order.
    pub phases: IndexMap<String, PhaseTotals>,
    /// `attempts[n]` counts compilations that retried `n` times; trimmed to
    /// the observed maximum.
    pub attempts: Vec<usize>,
    pub max_attempts: usize,
    pub created: usize,
    pub live: usize,
    pub cache_size: u64,
    pub peak_cache_size: u64,
    /// Zombie events for code that was never installed or already reclaimed.
    pub dangling_zombies: usize,
}

/// Single-pass fold over a log's events.
#[derive(Debug)]
pub struct StatisticsAggregator {
    compilations: Vec<CompileTime>,
    total_elapsed: f64,
    phases: IndexMap<String, PhaseTotals>,
    attempts: [usize; MAX_ATTEMPTS],
    max_attempts: usize,
    /// Sizes of installed code by compile id; the last install is reclaimed
    /// first.
    installed: HashMap<String, Vec<u64>>,
    created: usize,
    live: usize,
    cache_size: u64,
    peak_cache_size: u64,
    dangling_zombies: usize,
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self {
            compilations: Vec::new(),
            total_elapsed: 0.0,
            phases: IndexMap::new(),
            attempts: [0; MAX_ATTEMPTS],
            max_attempts: 0,
            installed: HashMap::new(),
            created: 0,
            live: 0,
            cache_size: 0,
            peak_cache_size: 0,
            dangling_zombies: 0,
        }
    }
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the totals.
    ///
    /// Fails without touching any total if a compilation retried register
    /// allocation `MAX_ATTEMPTS` times or more.
    pub fn observe(&mut self, event: &LogEvent) -> Result<(), ReportError> {
        match event {
            LogEvent::Compilation(c) => self.compilation(c)?,
            LogEvent::NMethod(nm) => {
                self.installed.entry(nm.id.clone()).or_default().push(nm.size);
                self.created += 1;
                self.live += 1;
                self.cache_size += nm.size;
                self.peak_cache_size =
                    self.peak_cache_size.max(self.cache_size);
            }
            LogEvent::MakeNotEntrant(mne) if mne.zombie => {
                match self.installed.get_mut(&mne.id).and_then(Vec::pop) {
                    Some(size) => {
                        self.cache_size -= size;
                        self.live -= 1;
                    }
                    None => {
                        warn!(
                            id = %mne.id,
                            stamp = mne.start,
                            "zombie for code that is not in the code cache"
                        );
                        self.dangling_zombies += 1;
                    }
                }
            }
            // Not-entrant code stays resident until it becomes a zombie.
            LogEvent::MakeNotEntrant(_)
            | LogEvent::Task(_)
            | LogEvent::UncommonTrap(_)
            | LogEvent::Other(_) => {}
        }
        Ok(())
    }

    fn compilation(&mut self, c: &Compilation) -> Result<(), ReportError> {
        let attempts = usize::try_from(c.attempts)
            .ok()
            .filter(|&n| n < MAX_ATTEMPTS)
            .ok_or_else(|| {
                ReportError::attempts_out_of_range(&c.id, c.attempts)
            })?;

        self.compilations.push(CompileTime {
            description: c.short_description(),
            elapsed: c.elapsed,
        });
        self.attempts[attempts] += 1;
        self.max_attempts = self.max_attempts.max(attempts);
        self.total_elapsed += c.elapsed;

        for phase in &c.phases {
            let totals = self.phases.entry(phase.name.clone()).or_default();
            totals.elapsed += phase.elapsed;
            totals.nodes += phase.nodes;
        }
        Ok(())
    }

    /// Bytes of installed code not yet reclaimed.
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    pub fn peak_cache_size(&self) -> u64 {
        self.peak_cache_size
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn finish(self) -> CompilationStatistics {
        CompilationStatistics {
            compilations: self.compilations,
            total_elapsed: self.total_elapsed,
            phases: self.phases,
            attempts: self.attempts[..=self.max_attempts].to_vec(),
            max_attempts: self.max_attempts,
            created: self.created,
            live: self.live,
            cache_size: self.cache_size,
            peak_cache_size: self.peak_cache_size,
            dangling_zombies: self.dangling_zombies,
        }
    }
}

impl CompilationStatistics {
    pub fn write_report(&self, mut w: impl Write) -> std::io::Result<()> {
        for compile in &self.compilations {
            writeln!(w, "{} {:6.4}", compile.description, compile.elapsed)?;
        }

        writeln!(
            w,
            "NMethods: {} created {} live {} bytes ({} peak) in the code cache",
            self.created, self.live, self.cache_size, self.peak_cache_size
        )?;

        writeln!(w, "Phase times:")?;
        for (name, totals) in &self.phases {
            writeln!(w, "{name:>20} {:6.4} {}", totals.elapsed, totals.nodes)?;
        }
        writeln!(w, "{:>20} {:6.4}", "total", self.total_elapsed)?;

        if self.max_attempts > 0 {
            writeln!(w, "Distribution of regalloc passes:")?;
            for (passes, count) in self.attempts.iter().enumerate() {
                writeln!(w, "{passes:2} {count:8}")?;
            }
        }
        Ok(())
    }
}

/// Runs a fresh aggregator over the whole log.
#[instrument(level = "debug", skip_all, fields(events = events.len()))]
pub fn statistics(
    events: &[LogEvent],
) -> Result<CompilationStatistics, ReportError> {
    let mut aggregator = StatisticsAggregator::new();
    for event in events {
        aggregator.observe(event)?;
    }
    Ok(aggregator.finish())
}
