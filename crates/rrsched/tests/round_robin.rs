//! Round-robin rotation driven by the simulated clock.

use rrsched::sim::SimHarness;
use rrsched::{Dispatch, SchedConfig, ThreadPriority};

fn harness(quantum: u64) -> SimHarness {
    let _ = env_logger::builder().is_test(true).try_init();
    SimHarness::new(SchedConfig::builder().quantum_ticks(quantum).build())
}

#[test]
fn three_threads_rotate_every_quantum() {
    let sim = harness(5);
    let task = sim.new_task(ThreadPriority(1));
    let t1 = sim.spawn(&task).expect("t1");
    let t2 = sim.spawn(&task).expect("t2");
    let t3 = sim.spawn(&task).expect("t3");

    // Each creation dispatches, so t1 holds the processor with [t3, t2] queued.
    assert_eq!(sim.running(), Some(t1.id()));

    let mut machine = sim.machine();
    let dispatches = machine.advance(30);

    let order: Vec<_> = dispatches.iter().filter_map(|d| d.thread()).collect();
    assert_eq!(
        order,
        vec![t3.id(), t2.id(), t1.id(), t3.id(), t2.id(), t1.id()]
    );
    assert_eq!(machine.clock(), 30);
}

#[test]
fn interrupt_fires_only_on_expiry() {
    let sim = harness(4);
    let task = sim.new_task(ThreadPriority(1));
    let a = sim.spawn(&task).unwrap();
    let b = sim.spawn(&task).unwrap();
    let mut machine = sim.machine();

    for _ in 0..3 {
        assert_eq!(machine.tick(), None);
    }
    assert_eq!(machine.tick(), Some(Dispatch::Running(a.id())));
    assert_eq!(machine.run_quantum(10), Some(Dispatch::Running(b.id())));
    assert_eq!(machine.clock(), 8);
}

#[test]
fn lone_thread_keeps_the_processor() {
    let sim = harness(3);
    let task = sim.new_task(ThreadPriority(1));
    let only = sim.spawn(&task).unwrap();
    let mut machine = sim.machine();

    let dispatches = machine.advance(9);

    assert_eq!(dispatches, vec![Dispatch::Running(only.id()); 3]);
    assert!(only.is_running());
    assert!(sim.scheduler.ready_ids().is_empty());
}

#[test]
fn idle_machine_never_interrupts() {
    let sim = harness(2);
    let mut machine = sim.machine();

    assert!(machine.advance(20).is_empty());
    assert_eq!(machine.run_quantum(5), None);
    assert!(!sim.timer.is_armed());
}

#[test]
fn killed_thread_drops_out_of_rotation() {
    let sim = harness(2);
    let task = sim.new_task(ThreadPriority(1));
    let t1 = sim.spawn(&task).unwrap();
    let t2 = sim.spawn(&task).unwrap();
    let t3 = sim.spawn(&task).unwrap();

    sim.scheduler.kill(&t2).unwrap();
    assert_eq!(sim.running(), Some(t3.id()));

    let mut machine = sim.machine();
    let order: Vec<_> = machine
        .advance(8)
        .into_iter()
        .filter_map(Dispatch::thread)
        .collect();

    assert_eq!(order, vec![t1.id(), t3.id(), t1.id(), t3.id()]);
}
