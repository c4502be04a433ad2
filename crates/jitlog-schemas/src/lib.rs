//! Event model for HotSpot compilation log analysis.
//!
//! This crate defines the typed events that a compilation log is parsed
//! into: compile queue transitions, compilations with their phases and
//! inlining decisions, installed code, invalidations, and uncommon traps.
//! Every analysis in `jitlog-report` consumes a slice of [`LogEvent`] and
//! never mutates it.
//!
//! The types serialize with serde so a log can travel as JSON Lines between
//! the parser and the reports.

mod event;
mod index;
mod method;
#[cfg(test)]
mod testutil;

#[doc(inline)]
pub use event::*;
#[doc(inline)]
pub use index::EventIndex;
#[doc(inline)]
pub use method::*;
