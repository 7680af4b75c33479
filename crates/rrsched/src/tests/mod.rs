
use crate::config::SchedConfig;
use crate::sim::SimHarness;
use crate::thread::{ThreadId, ThreadPriority, ThreadRef};

fn harness(max_threads: usize) -> SimHarness {
    let _ = env_logger::builder().is_test(true).try_init();
    SimHarness::new(
        SchedConfig::builder()
            .max_threads_per_task(max_threads)
            .build(),
    )
}

fn ids(threads: &[&ThreadRef]) -> Vec<ThreadId> {
    threads.iter().map(|thread| thread.id()).collect()
}

const PRIO: ThreadPriority = ThreadPriority(3);
