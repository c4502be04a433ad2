//! Typed compilation log events.
//!
//! A log is a flat, time-ordered sequence of [`LogEvent`]s. Each variant
//! carries only the fields the analyses read; anything else the JIT emits is
//! folded into [`OtherEvent`].
//!
//! ## Wire format
//!
//! Events are internally tagged by an `"event"` field:
//!
//! ```json
//! {"event":"task","id":"12","start":0.25,"kind":"enqueue","level":3}
//! {"event":"nmethod","id":"12","start":0.31,"size":1024}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::method::{CallSite, JvmState, Method};

/// One record of the compilation log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    Task(TaskEvent),
    Compilation(Compilation),
    #[serde(rename = "nmethod")]
    NMethod(NMethod),
    MakeNotEntrant(MakeNotEntrantEvent),
    UncommonTrap(UncommonTrapEvent),
    Other(OtherEvent),
}

impl LogEvent {
    /// Timestamp of the event in seconds since VM start.
    pub fn start(&self) -> f64 {
        match self {
            LogEvent::Task(e) => e.start,
            LogEvent::Compilation(e) => e.start,
            LogEvent::NMethod(e) => e.start,
            LogEvent::MakeNotEntrant(e) => e.start,
            LogEvent::UncommonTrap(e) => e.start,
            LogEvent::Other(e) => e.start,
        }
    }

    /// Compile id the event refers to, if it has one.
    pub fn id(&self) -> Option<&str> {
        match self {
            LogEvent::Task(e) => Some(&e.id),
            LogEvent::Compilation(e) => Some(&e.id),
            LogEvent::NMethod(e) => Some(&e.id),
            LogEvent::MakeNotEntrant(e) => Some(&e.id),
            LogEvent::UncommonTrap(e) => Some(&e.id),
            LogEvent::Other(e) => e.id.as_deref(),
        }
    }

    /// Elapsed compile time; zero for everything but compilations.
    pub fn elapsed(&self) -> f64 {
        match self {
            LogEvent::Compilation(c) => c.elapsed,
            _ => 0.0,
        }
    }
}

/// Compile queue transition kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Enqueue,
    Dequeue,
    Finish,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so width specifiers in report tables apply.
        f.pad(match self {
            TaskKind::Enqueue => "Enqueue",
            TaskKind::Dequeue => "Dequeue",
            TaskKind::Finish => "Finish",
        })
    }
}

/// A compile task entering or leaving the compile queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Compile id; unique per enqueue.
    pub id: String,
    pub start: f64,
    pub kind: TaskKind,
    /// Compile tier the task is queued at or leaves from.
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A named sub-stage of one compilation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    /// Seconds spent in the phase.
    pub elapsed: f64,
    /// Nodes created by the phase.
    #[serde(default)]
    pub nodes: u64,
}

/// A single compilation of a method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Compilation {
    pub id: String,
    pub start: f64,
    /// Seconds from task start to completion.
    #[serde(default)]
    pub elapsed: f64,
    pub method: Method,
    /// Entry bci for on-stack-replacement compilations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osr_bci: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Register allocation passes that had to be retried.
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<Phase>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eliminated_locks: Vec<JvmState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inlining: Vec<CallSite>,
    /// Set when the compilation bailed out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl Compilation {
    /// One-line identification: compile id, OSR marker and method.
    pub fn short_description(&self) -> String {
        match self.osr_bci {
            Some(bci) => format!("{} % {} @ {bci}", self.id, self.method),
            None => format!("{}   {}", self.id, self.method),
        }
    }
}

/// Installed compiled code occupying space in the code cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NMethod {
    /// Compile id of the compilation that produced this code.
    pub id: String,
    pub start: f64,
    /// Bytes occupied in the code cache.
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

/// Compiled code being made not entrant, or reclaimed as a zombie.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MakeNotEntrantEvent {
    /// Compile id of the affected nmethod.
    pub id: String,
    pub start: f64,
    #[serde(default)]
    pub zombie: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

/// A deoptimization out of compiled code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UncommonTrapEvent {
    /// Compile id of the compilation whose code trapped.
    pub id: String,
    pub start: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bci: Option<i32>,
}

impl UncommonTrapEvent {
    /// Human-readable trap description, whitespace-trimmed.
    ///
    /// Traps with equal descriptions on the same method are considered the
    /// same deoptimization cause.
    pub fn format_trap(&self) -> String {
        let mut text = self.reason.trim().to_owned();
        if let Some(action) = self.action.as_deref().map(str::trim)
            && !action.is_empty()
        {
            text.push_str(" action=");
            text.push_str(action);
        }
        if let Some(bci) = self.bci {
            text.push_str(&format!(" @{bci}"));
        }
        text.trim().to_owned()
    }
}

/// Any record the analyses do not interpret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OtherEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub start: f64,
    pub name: String,
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use crate::testutil::arb_log_event;

    proptest! {
        /// Every variant survives the JSON Lines wire format intact.
        #[test]
        fn test_log_event_roundtrip(event in arb_log_event()) {
            let json = serde_json::to_string(&event).expect("serialize");
            prop_assert!(!json.contains('\n'));
            let parsed: LogEvent =
                serde_json::from_str(&json).expect("deserialize");
            prop_assert_eq!(parsed, event);
        }
    }
}
