//! Randomised lifecycle sequences checked against the scheduler's invariants.

use std::sync::Arc;

use proptest::prelude::*;
use rrsched::sim::{SimHarness, WaitQueue};
use rrsched::{SchedConfig, ThreadPriority, ThreadRef, TimerInterruptHandler};

#[derive(Debug, Clone)]
enum Op {
    Create(usize),
    Kill(usize),
    Suspend(usize, usize),
    Notify(usize),
    Interrupt,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..2usize).prop_map(Op::Create),
        1 => (0..32usize).prop_map(Op::Kill),
        2 => (0..32usize, 0..2usize).prop_map(|(thread, event)| Op::Suspend(thread, event)),
        2 => (0..2usize).prop_map(Op::Notify),
        2 => Just(Op::Interrupt),
    ]
}

fn pick(threads: &[ThreadRef], index: usize) -> Option<&ThreadRef> {
    if threads.is_empty() {
        None
    } else {
        threads.get(index % threads.len())
    }
}

fn check(
    sim: &SimHarness,
    threads: &[ThreadRef],
    events: &[WaitQueue],
) -> Result<(), TestCaseError> {
    let queued = sim.scheduler.ready_ids();
    let mut unique = queued.clone();
    unique.sort();
    unique.dedup();
    prop_assert_eq!(unique.len(), queued.len(), "duplicate in ready queue");

    let running: Vec<&ThreadRef> = threads.iter().filter(|t| t.is_running()).collect();
    prop_assert!(running.len() <= 1, "more than one running thread");
    prop_assert_eq!(running.first().map(|t| t.id()), sim.running());
    if !queued.is_empty() {
        prop_assert!(sim.running().is_some(), "processor idle with ready threads");
    }

    for thread in threads {
        let in_queue = queued.contains(&thread.id());
        prop_assert_eq!(thread.is_ready(), in_queue, "{} ready/queued mismatch", thread);
        if in_queue || thread.is_running() {
            for event in events {
                prop_assert!(!event.contains(thread.id()), "{} queued and waiting", thread);
            }
        }
    }

    let live = threads.iter().filter(|t| !t.is_killed()).count();
    prop_assert_eq!(sim.scheduler.snapshot().live_threads, live);
    Ok(())
}

proptest! {
    #[test]
    fn lifecycle_preserves_invariants(ops in prop::collection::vec(op(), 1..64)) {
        let sim = SimHarness::new(SchedConfig::default());
        let tasks = [sim.new_task(ThreadPriority(1)), sim.new_task(ThreadPriority(2))];
        let events = [WaitQueue::new(), WaitQueue::new()];
        let handler = TimerInterruptHandler::new(Arc::clone(&sim.scheduler));
        let mut threads: Vec<ThreadRef> = Vec::new();

        for op in ops {
            match op {
                Op::Create(task) => {
                    if let Some(thread) = sim.spawn(&tasks[task]) {
                        threads.push(thread);
                    }
                }
                Op::Kill(index) => {
                    if let Some(thread) = pick(&threads, index) {
                        let _ = sim.scheduler.kill(thread);
                    }
                }
                Op::Suspend(index, event) => {
                    if let Some(thread) = pick(&threads, index) {
                        let _ = sim.scheduler.suspend(thread, &events[event]);
                    }
                }
                Op::Notify(event) => {
                    events[event].notify_all(&sim.scheduler);
                }
                Op::Interrupt => {
                    handler.handle_interrupt();
                }
            }
            check(&sim, &threads, &events)?;
        }
    }

    #[test]
    fn every_thread_runs_once_per_round(count in 1usize..8, rounds in 1usize..5) {
        let sim = SimHarness::new(SchedConfig::default());
        let task = sim.new_task(ThreadPriority(1));
        let threads: Vec<ThreadRef> = (0..count).filter_map(|_| sim.spawn(&task)).collect();
        prop_assert_eq!(threads.len(), count);

        let handler = TimerInterruptHandler::new(Arc::clone(&sim.scheduler));
        let picks: Vec<_> = (0..count * rounds)
            .filter_map(|_| handler.handle_interrupt().thread())
            .collect();

        for thread in &threads {
            let runs = picks.iter().filter(|id| **id == thread.id()).count();
            prop_assert_eq!(runs, rounds);
        }
    }
}
