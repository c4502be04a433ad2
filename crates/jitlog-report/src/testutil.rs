//! Event builders and proptest strategies shared by report tests.

use jitlog_schemas::{
    Compilation, LogEvent, MakeNotEntrantEvent, Method, NMethod, Phase,
    TaskEvent, TaskKind, UncommonTrapEvent,
};
use proptest::prelude::*;

pub fn task(id: &str, kind: TaskKind, level: u8, start: f64) -> LogEvent {
    LogEvent::Task(TaskEvent {
        id: id.to_string(),
        start,
        kind,
        level,
        comment: None,
    })
}

pub fn enqueue(id: &str, level: u8, start: f64) -> LogEvent {
    task(id, TaskKind::Enqueue, level, start)
}

pub fn finish(id: &str, level: u8, start: f64) -> LogEvent {
    task(id, TaskKind::Finish, level, start)
}

/// A compilation of `holder::name` with no phases or retries.
pub fn compile(id: &str, holder: &str, name: &str, start: f64) -> Compilation {
    Compilation {
        id: id.to_string(),
        start,
        elapsed: 0.0,
        method: Method::new(holder, name, 20),
        osr_bci: None,
        level: Some(4),
        attempts: 0,
        phases: Vec::new(),
        eliminated_locks: Vec::new(),
        inlining: Vec::new(),
        failure: None,
    }
}

pub fn compilation(id: &str, holder: &str, name: &str, start: f64) -> LogEvent {
    LogEvent::Compilation(compile(id, holder, name, start))
}

pub fn phase(name: &str, elapsed: f64, nodes: u64) -> Phase {
    Phase {
        name: name.to_string(),
        elapsed,
        nodes,
    }
}

pub fn nmethod(id: &str, size: u64, start: f64) -> LogEvent {
    LogEvent::NMethod(NMethod {
        id: id.to_string(),
        start,
        size,
        address: None,
        level: None,
    })
}

pub fn not_entrant(id: &str, zombie: bool, start: f64) -> LogEvent {
    LogEvent::MakeNotEntrant(MakeNotEntrantEvent {
        id: id.to_string(),
        start,
        zombie,
        level: None,
    })
}

pub fn trap(id: &str, reason: &str, start: f64) -> LogEvent {
    LogEvent::UncommonTrap(UncommonTrapEvent {
        id: id.to_string(),
        start,
        reason: reason.to_string(),
        action: None,
        bci: None,
    })
}

/// Balanced enqueue/finish pairs, each task finishing at its own level.
///
/// Each task `i` is enqueued at time `i` and finishes at `i + lifetime`,
/// so queue residency overlaps arbitrarily. Events come back sorted by
/// start with ties in generation order.
pub fn arb_balanced_tasks() -> impl Strategy<Value = Vec<LogEvent>> {
    prop::collection::vec((1..=4u8, 0..20u32), 0..40).prop_map(|tasks| {
        let mut events = Vec::new();
        for (i, (level, lifetime)) in tasks.into_iter().enumerate() {
            let id = i.to_string();
            let begin = f64::from(u32::try_from(i).expect("small index"));
            events.push(enqueue(&id, level, begin));
            events.push(finish(&id, level, begin + f64::from(lifetime)));
        }
        events.sort_by(|a, b| a.start().total_cmp(&b.start()));
        events
    })
}

/// Installs and reclaims of code, including zombies for unknown ids.
pub fn arb_code_cache_events() -> impl Strategy<Value = Vec<LogEvent>> {
    let op = prop_oneof![
        (0..8u32, 1..5_000u64)
            .prop_map(|(id, size)| nmethod(&id.to_string(), size, 0.0)),
        (0..8u32, any::<bool>())
            .prop_map(|(id, zombie)| not_entrant(&id.to_string(), zombie, 0.0)),
    ];
    prop::collection::vec(op, 0..60)
}

/// A compilation with retries below the histogram limit and phases drawn
/// from a small set of names, so names repeat within and across
/// compilations.
pub fn arb_compilation(id: u32) -> impl Strategy<Value = LogEvent> {
    let phase = (
        prop::sample::select(vec!["parse", "optimizer", "regalloc"]),
        0..1_000u32,
        0..10_000u64,
    )
        .prop_map(|(name, ms, nodes)| phase(name, f64::from(ms) / 1e3, nodes));
    (0..32u32, 0..1_000u32, prop::collection::vec(phase, 0..6)).prop_map(
        move |(attempts, ms, phases)| {
            LogEvent::Compilation(Compilation {
                elapsed: f64::from(ms) / 1e3,
                attempts,
                phases,
                ..compile(&id.to_string(), "p/Foo", "bar", 0.0)
            })
        },
    )
}

/// Code-cache traffic interleaved with compilations.
pub fn arb_statistics_events() -> impl Strategy<Value = Vec<LogEvent>> {
    let op = prop_oneof![
        (0..8u32, 1..5_000u64)
            .prop_map(|(id, size)| nmethod(&id.to_string(), size, 0.0)),
        (0..8u32, any::<bool>())
            .prop_map(|(id, zombie)| not_entrant(&id.to_string(), zombie, 0.0)),
        (0..8u32).prop_flat_map(arb_compilation),
    ];
    prop::collection::vec(op, 0..60)
}
