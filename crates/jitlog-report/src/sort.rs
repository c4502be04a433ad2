//! Orderings for the per-event reports.

use std::cmp::Ordering;

use jitlog_schemas::{EventIndex, LogEvent};

/// Key the plain and eliminated-locks reports are ordered by.
///
/// Every ordering is stable and ascending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Timestamp, i.e. log order.
    #[default]
    Start,
    /// Compile time; events that are not compilations count as zero.
    Elapsed,
    /// Method of the owning compilation, then timestamp. Events without an
    /// owning compilation come first.
    NameAndStart,
}

/// Returns the events reordered by `order`.
pub fn sorted(events: &[LogEvent], order: SortOrder) -> Vec<&LogEvent> {
    let mut refs: Vec<&LogEvent> = events.iter().collect();
    match order {
        SortOrder::Start => refs.sort_by(|a, b| start_cmp(a, b)),
        SortOrder::Elapsed => {
            refs.sort_by(|a, b| a.elapsed().total_cmp(&b.elapsed()));
        }
        SortOrder::NameAndStart => {
            let index = EventIndex::new(events);
            let mut keyed: Vec<(Option<String>, &LogEvent)> = refs
                .into_iter()
                .map(|event| {
                    let name = index
                        .owning_compilation(event)
                        .map(|c| c.method.to_string());
                    (name, event)
                })
                .collect();
            keyed.sort_by(|(a_name, a), (b_name, b)| {
                a_name.cmp(b_name).then_with(|| start_cmp(a, b))
            });
            refs = keyed.into_iter().map(|(_, event)| event).collect();
        }
    }
    refs
}

fn start_cmp(a: &LogEvent, b: &LogEvent) -> Ordering {
    a.start().total_cmp(&b.start())
}
