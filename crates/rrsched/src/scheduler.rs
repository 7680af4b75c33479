//! Thread lifecycle and round-robin dispatcher.
//!
//! ## Scheduling Policy
//!
//! 1. The ready queue is strictly FIFO; priorities are carried, not used.
//! 2. Every dispatch preempts the bound thread (if any) to the queue tail and
//!    binds the queue head, so a lone ready thread is simply reselected.
//! 3. Each successful dispatch arms the timer for one quantum.
//! 4. Every lifecycle operation ends by dispatching, failure paths included.
//!
//! The processor binding is never stored here. The current thread is always
//! resolved through MMU binding, page table, task and the task's current
//! thread, any of which may be missing.

use core::fmt;

use crate::config::SchedConfig;
use crate::error::{CreateError, SchedError};
use crate::platform::{Event, Platform, TaskRef};
use crate::ready::ReadyQueue;
use crate::sync::{Arc, Mutex};
use crate::thread::{ThreadCb, ThreadId, ThreadRef, ThreadStatus};
use crate::trace::{records, words, TraceHook};

/// Outcome of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The thread now bound to the processor.
    Running(ThreadId),
    /// Nothing was ready; the processor is idle.
    Idle,
}

impl Dispatch {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn thread(self) -> Option<ThreadId> {
        match self {
            Self::Running(id) => Some(id),
            Self::Idle => None,
        }
    }
}

/// Point-in-time view of the scheduler used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedSnapshot {
    pub running: Option<ThreadId>,
    pub ready: Vec<ThreadId>,
    pub live_threads: usize,
}

impl fmt::Display for SchedSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.running {
            Some(id) => write!(f, "running={id}")?,
            None => write!(f, "running=idle")?,
        }
        write!(f, " ready=[")?;
        for (index, id) in self.ready.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "] live={}", self.live_threads)
    }
}

#[derive(Default)]
struct State {
    ready: ReadyQueue,
    next_id: u32,
    live: usize,
}

/// Builder for constructing a scheduler.
pub struct SchedulerBuilder {
    platform: Platform,
    config: SchedConfig,
    trace: Option<TraceHook>,
}

impl SchedulerBuilder {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            config: SchedConfig::default(),
            trace: None,
        }
    }

    pub fn config(mut self, config: SchedConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the trace hook for scheduling records.
    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn build(self) -> Scheduler {
        Scheduler {
            config: self.config,
            platform: self.platform,
            state: Mutex::new(State::default()),
            trace: Mutex::new(self.trace),
        }
    }
}

/// Scheduler context: ready queue, thread lifecycle and dispatcher.
///
/// One instance exists per simulated machine; it is created at simulation
/// start and torn down with [`Scheduler::shutdown`].
pub struct Scheduler {
    config: SchedConfig,
    platform: Platform,
    state: Mutex<State>,
    trace: Mutex<Option<TraceHook>>,
}

impl Scheduler {
    pub fn builder(platform: Platform) -> SchedulerBuilder {
        SchedulerBuilder::new(platform)
    }

    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn set_trace_hook(&self, trace: Option<TraceHook>) {
        *self.trace.lock() = trace;
    }

    /// Creates a thread in `task` and queues it.
    ///
    /// Dispatches whether or not a thread was produced.
    pub fn create_thread(&self, task: Option<&TaskRef>) -> Result<ThreadRef, CreateError> {
        let created = self.spawn_ready(task);
        match &created {
            Ok(thread) => {
                log::debug!("created {} (priority {})", thread.id(), thread.priority().0);
                self.emit_record(
                    records::thread::CREATE,
                    &[thread.id().0, u32::from(thread.priority().0)],
                );
            }
            Err(err) => {
                log::debug!("thread creation refused: {err}");
                self.emit_record(records::thread::CREATE_FAILED, &[err.code()]);
            }
        }

        self.dispatch();
        created
    }

    fn spawn_ready(&self, task: Option<&TaskRef>) -> Result<ThreadRef, CreateError> {
        let task = task.ok_or(CreateError::NoTask)?;

        let count = task.thread_count();
        let max = self.config.max_threads_per_task;
        if count >= max {
            return Err(CreateError::TaskFull { count, max });
        }

        let id = self.allocate_id();
        let thread = ThreadCb::new(id, Arc::clone(task), task.priority());
        task.add_thread(&thread)?;

        let mut state = self.state.lock();
        state.live += 1;
        state.ready.append(Arc::clone(&thread));
        Ok(thread)
    }

    /// Destroys `thread`.
    ///
    /// Releases the processor if the thread holds it, detaches it from its
    /// task, cancels its I/O and gives up its resources, dispatches, and kills
    /// the task once its last thread is gone.
    pub fn kill(&self, thread: &ThreadRef) -> Result<(), SchedError> {
        let status = thread.status();
        match status {
            ThreadStatus::Killed => {
                log::warn!("attempt to kill {}, which is already dead", thread.id());
                return Err(SchedError::Killed(thread.id()));
            }
            ThreadStatus::Ready => {
                self.state.lock().ready.remove(thread);
            }
            ThreadStatus::Running => {
                self.release_processor(thread);
            }
            ThreadStatus::Waiting(_) => {}
        }

        let task = Arc::clone(thread.task());
        task.remove_thread(thread);
        thread.set_status(ThreadStatus::Killed);
        {
            let mut state = self.state.lock();
            state.live = state.live.saturating_sub(1);
        }

        for device in self.platform.devices() {
            device.cancel_pending_io(thread);
        }
        self.platform.resources.giveup_resources(thread);

        log::debug!("killed {} (was {status})", thread.id());
        self.emit_record(records::thread::KILL, &[thread.id().0]);
        self.dispatch();

        if task.thread_count() == 0 {
            log::debug!("last thread of task gone, killing task");
            task.kill();
        }
        Ok(())
    }

    /// Suspends `thread` on `event`.
    ///
    /// A running thread leaves the processor and waits on one event; a
    /// waiting thread stacks one more wait cause. Ready and killed threads
    /// cannot be suspended and are left untouched. Dispatches in every case.
    pub fn suspend(&self, thread: &ThreadRef, event: &dyn Event) -> Result<(), SchedError> {
        let parked = self.park(thread, event);
        self.dispatch();
        parked
    }

    fn park(&self, thread: &ThreadRef, event: &dyn Event) -> Result<(), SchedError> {
        let status = thread.status();
        let Some(waiting) = status.deepen() else {
            log::warn!("attempt to suspend {}, which is {status}", thread.id());
            return Err(match status {
                ThreadStatus::Killed => SchedError::Killed(thread.id()),
                _ => SchedError::NotSuspendable {
                    id: thread.id(),
                    status,
                },
            });
        };

        if status == ThreadStatus::Running {
            self.release_processor(thread);
        }
        thread.set_status(waiting);

        let queued = self.state.lock().ready.contains(thread);
        if !queued {
            event.add_thread(thread);
        }

        log::debug!("suspended {} ({waiting})", thread.id());
        self.emit_record(
            records::thread::SUSPEND,
            &[thread.id().0, waiting.wait_depth()],
        );
        Ok(())
    }

    /// Resumes `thread` from one wait cause.
    ///
    /// Only waiting threads can be resumed; anything else is reported and
    /// left alone without dispatching.
    pub fn resume(&self, thread: &ThreadRef) -> Result<(), SchedError> {
        let status = thread.status();
        let Some(next) = status.unwind() else {
            log::warn!("attempt to resume {}, which wasn't waiting", thread.id());
            return Err(SchedError::NotWaiting {
                id: thread.id(),
                status,
            });
        };

        log::debug!("resuming {}", thread.id());
        thread.set_status(next);
        if next == ThreadStatus::Ready {
            self.state.lock().ready.append(Arc::clone(thread));
        }

        self.emit_record(records::thread::RESUME, &[thread.id().0, next.wait_depth()]);
        self.dispatch();
        Ok(())
    }

    /// Picks the thread that occupies the processor next.
    pub fn dispatch(&self) -> Dispatch {
        let previous = self.current_thread();

        if let Some(thread) = &previous {
            thread.task().set_current_thread(None);
            self.platform.mmu.set_ptbr(None);
            thread.set_status(ThreadStatus::Ready);
            self.state.lock().ready.append(Arc::clone(thread));
            self.emit_record(records::sched::PREEMPT, &[thread.id().0]);
        }
        let previous_id = previous.as_ref().map_or(0, |thread| thread.id().0);

        let head = self.state.lock().ready.remove_head();
        let Some(next) = head else {
            self.platform.mmu.set_ptbr(None);
            log::trace!("no ready thread, processor idle");
            self.emit_record(records::sched::IDLE, &[previous_id]);
            return Dispatch::Idle;
        };

        let task = next.task();
        self.platform.mmu.set_ptbr(Some(task.page_table()));
        task.set_current_thread(Some(Arc::clone(&next)));
        next.set_status(ThreadStatus::Running);
        self.platform.timer.set(self.config.quantum_ticks);

        log::trace!("dispatched {} for {} ticks", next.id(), self.config.quantum_ticks);
        self.emit_record(records::sched::NEXT, &[next.id().0, previous_id]);
        Dispatch::Running(next.id())
    }

    /// Thread bound to the processor, following MMU binding, page table,
    /// task and the task's current thread.
    pub fn current_thread(&self) -> Option<ThreadRef> {
        self.platform.mmu.ptbr()?.task()?.current_thread()
    }

    /// Queued ids, head first.
    pub fn ready_ids(&self) -> Vec<ThreadId> {
        self.state.lock().ready.ids()
    }

    pub fn is_queued(&self, thread: &ThreadCb) -> bool {
        self.state.lock().ready.contains(thread)
    }

    pub fn snapshot(&self) -> SchedSnapshot {
        let running = self.current_thread().map(|thread| thread.id());
        let state = self.state.lock();
        SchedSnapshot {
            running,
            ready: state.ready.ids(),
            live_threads: state.live,
        }
    }

    /// Dumps scheduler state after the simulator reported an error.
    pub fn at_error(&self) {
        log::error!("[{}] {}", self.config.name, self.snapshot());
    }

    /// Dumps scheduler state after the simulator reported a warning.
    pub fn at_warning(&self) {
        log::warn!("[{}] {}", self.config.name, self.snapshot());
    }

    /// Tears the context down at simulation end.
    pub fn shutdown(&self) {
        if let Some(thread) = self.current_thread() {
            thread.task().set_current_thread(None);
        }
        self.platform.mmu.set_ptbr(None);
        self.state.lock().ready.clear();
        log::debug!("[{}] scheduler shut down", self.config.name);
    }

    fn release_processor(&self, thread: &ThreadRef) -> bool {
        match self.current_thread() {
            Some(bound) if bound.id() == thread.id() => {
                self.platform.mmu.set_ptbr(None);
                thread.task().set_current_thread(None);
                true
            }
            _ => false,
        }
    }

    fn allocate_id(&self) -> ThreadId {
        let mut state = self.state.lock();
        state.next_id = state.next_id.wrapping_add(1);
        ThreadId(state.next_id)
    }

    fn emit_record(&self, record: u8, payload: &[u32]) {
        let trace = self.trace.lock().clone();

        if let Some(trace) = trace {
            let _ = trace(record, &words(payload), true);
        }
    }
}
