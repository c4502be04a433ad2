//! Lock sites removed by escape analysis and lock coarsening.

use std::io::{self, Write};

use jitlog_schemas::{Compilation, LogEvent};

use crate::plain::write_compilation;
use crate::sort::{SortOrder, sorted};

/// Compilations that eliminated at least one lock, in report order.
#[derive(Debug)]
pub struct EliminatedLocksReport<'a> {
    compilations: Vec<&'a Compilation>,
}

impl EliminatedLocksReport<'_> {
    pub fn compilations(&self) -> impl Iterator<Item = &Compilation> {
        self.compilations.iter().copied()
    }

    /// Writes each compilation followed by its elimination sites, one inlining
    /// chain per line from the innermost frame out.
    pub fn write_report(&self, mut w: impl Write) -> io::Result<()> {
        for c in self.compilations() {
            write_compilation(&mut w, c, false)?;
            writeln!(w, "  Eliminated locks")?;
            for site in &c.eliminated_locks {
                writeln!(w, "   {site}")?;
            }
        }
        Ok(())
    }
}

pub fn eliminated_locks(
    events: &[LogEvent],
    order: SortOrder,
) -> EliminatedLocksReport<'_> {
    let compilations = sorted(events, order)
        .into_iter()
        .filter_map(|event| match event {
            LogEvent::Compilation(c) if !c.eliminated_locks.is_empty() => {
                Some(c)
            }
            _ => None,
        })
        .collect();
    EliminatedLocksReport { compilations }
}

#[cfg(test)]
mod tests {
    use jitlog_schemas::{JvmState, Method};

    use super::*;
    use crate::testutil::{compilation, compile, trap};

    fn frame(holder: &str, name: &str, bci: i32) -> JvmState {
        JvmState {
            method: Method::new(holder, name, 4),
            bci,
            outer: None,
        }
    }

    #[test]
    fn lists_sites_innermost_first() {
        let mut site = frame("java/util/Vector", "add", 2);
        site.outer = Some(Box::new(frame("app/Main", "fill", 17)));

        let mut c = compile("5", "app/Main", "fill", 0.25);
        c.eliminated_locks = vec![site, frame("app/Main", "fill", 30)];
        let events = vec![
            compilation("4", "app/Main", "other", 0.0),
            LogEvent::Compilation(c),
            trap("5", "null_check", 0.5),
        ];

        let report = eliminated_locks(&events, SortOrder::Start);
        assert_eq!(report.compilations().count(), 1);

        let mut out = Vec::new();
        report.write_report(&mut out).expect("write to Vec");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "5   app.Main::fill (20 bytes)\n\
             \x20 Eliminated locks\n\
             \x20   java.util.Vector.add@2 app.Main.fill@17\n\
             \x20   app.Main.fill@30\n"
        );
    }

    #[test]
    fn header_has_no_timestamp() {
        let mut c = compile("9", "a/A", "f", 3.5);
        c.eliminated_locks = vec![frame("a/A", "f", 1)];
        c.failure = Some("out of nodes".to_string());
        let events = vec![LogEvent::Compilation(c)];

        let mut out = Vec::new();
        eliminated_locks(&events, SortOrder::Start)
            .write_report(&mut out)
            .expect("write to Vec");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("9   a.A::f (20 bytes)\n"));
        assert!(!text.contains("3.5"));
        assert!(text.contains("  COMPILE FAILED out of nodes\n"));
    }

    #[test]
    fn empty_without_eliminations() {
        let events = vec![compilation("1", "a/A", "f", 0.0)];
        let report = eliminated_locks(&events, SortOrder::Elapsed);
        assert_eq!(report.compilations().count(), 0);
    }
}
