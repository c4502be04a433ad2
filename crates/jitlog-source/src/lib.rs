//! Event sources for HotSpot compilation logs.
//!
//! An [`EventSource`] turns one input into a finite, validated sequence of
//! [`LogEvent`]s sorted by timestamp. Everything format-specific, including
//! tolerance for damaged input, lives behind this trait so the reports only
//! ever see well-formed events.
//!
//! ## Usage
//!
//! ```no_run
//! use jitlog_source::{EventSource, JsonLinesSource};
//!
//! let mut source = JsonLinesSource::open("hotspot.jsonl", false).unwrap();
//! let events = source.read_events().unwrap();
//! println!("{} events", events.len());
//! ```

mod error;
mod jsonl;

#[doc(inline)]
pub use jitlog_schemas::LogEvent;

#[doc(inline)]
pub use crate::error::SourceError;
#[doc(inline)]
pub use crate::jsonl::JsonLinesSource;

/// A producer of compilation log events.
///
/// Implementations return events in non-decreasing `start` order; events
/// with equal timestamps stay in input order.
pub trait EventSource {
    /// Reads the whole input.
    fn read_events(&mut self) -> Result<Vec<LogEvent>, SourceError>;
}
