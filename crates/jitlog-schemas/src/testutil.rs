//! Shared proptest strategies for schema tests.

use proptest::prelude::*;

use crate::{
    Compilation, LogEvent, MakeNotEntrantEvent, Method, NMethod, Phase,
    TaskEvent, TaskKind, UncommonTrapEvent,
};

/// Strategy for generating arbitrary identifier-like names.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,19}"
}

/// Strategy for internal-form class names (e.g., `java/util/HashMap`).
pub fn arb_holder() -> impl Strategy<Value = String> {
    (arb_name(), arb_name()).prop_map(|(pkg, class)| format!("{pkg}/{class}"))
}

/// Integer-valued seconds; fractional floats can drift by an ulp through JSON.
pub fn arb_seconds() -> impl Strategy<Value = f64> {
    (0..100_000u32).prop_map(f64::from)
}

pub fn arb_method() -> impl Strategy<Value = Method> {
    (arb_holder(), arb_name(), 0..4096u32)
        .prop_map(|(holder, name, bytes)| Method::new(holder, name, bytes))
}

fn arb_phase() -> impl Strategy<Value = Phase> {
    (arb_name(), arb_seconds(), 0..10_000u64)
        .prop_map(|(name, elapsed, nodes)| Phase { name, elapsed, nodes })
}

fn arb_task_kind() -> impl Strategy<Value = TaskKind> {
    prop_oneof![
        Just(TaskKind::Enqueue),
        Just(TaskKind::Dequeue),
        Just(TaskKind::Finish),
    ]
}

/// Strategy for arbitrary events of every analyzed variant.
pub fn arb_log_event() -> impl Strategy<Value = LogEvent> {
    let id = || (0..500u32).prop_map(|n| n.to_string());
    prop_oneof![
        (id(), arb_seconds(), arb_task_kind(), 1..=4u8).prop_map(
            |(id, start, kind, level)| LogEvent::Task(TaskEvent {
                id,
                start,
                kind,
                level,
                comment: None,
            })
        ),
        (
            id(),
            arb_seconds(),
            arb_method(),
            0..32u32,
            prop::collection::vec(arb_phase(), 0..4)
        )
            .prop_map(|(id, start, method, attempts, phases)| {
                LogEvent::Compilation(Compilation {
                    id,
                    start,
                    elapsed: 1.0,
                    method,
                    osr_bci: None,
                    level: Some(4),
                    attempts,
                    phases,
                    eliminated_locks: Vec::new(),
                    inlining: Vec::new(),
                    failure: None,
                })
            }),
        (id(), arb_seconds(), 1..100_000u64).prop_map(|(id, start, size)| {
            LogEvent::NMethod(NMethod {
                id,
                start,
                size,
                address: None,
                level: None,
            })
        }),
        (id(), arb_seconds(), any::<bool>()).prop_map(|(id, start, zombie)| {
            LogEvent::MakeNotEntrant(MakeNotEntrantEvent {
                id,
                start,
                zombie,
                level: None,
            })
        }),
        (id(), arb_seconds(), arb_name()).prop_map(|(id, start, reason)| {
            LogEvent::UncommonTrap(UncommonTrapEvent {
                id,
                start,
                reason,
                action: None,
                bci: None,
            })
        }),
    ]
}
