//! Reference collaborators.
//!
//! Minimal, in-memory implementations of every trait in
//! [`platform`](crate::platform). They keep just enough bookkeeping to drive
//! the scheduler end to end and to observe what it did.

use std::collections::BTreeMap;

use crate::config::SchedConfig;
use crate::error::AttachError;
use crate::machine::Machine;
use crate::platform::{
    Device, DeviceRef, DeviceTable, Event, Mmu, PageTable, PageTableRef, Platform,
    ResourceManager, Task, TaskRef,
};
use crate::scheduler::Scheduler;
use crate::sync::{Arc, Mutex, Weak};
use crate::thread::{ThreadId, ThreadPriority, ThreadRef};
use crate::timer::HardwareTimer;
use crate::trace::TraceHook;

struct TaskInner {
    threads: Vec<ThreadRef>,
    current: Option<ThreadRef>,
    alive: bool,
    kills: usize,
}

/// A task holding its threads in creation order.
pub struct SimTask {
    id: u32,
    priority: ThreadPriority,
    attach_limit: Option<usize>,
    page_table: Arc<SimPageTable>,
    inner: Mutex<TaskInner>,
}

impl SimTask {
    pub fn new(id: u32, priority: ThreadPriority) -> Arc<Self> {
        Self::build(id, priority, None)
    }

    /// A task whose own attach step refuses threads beyond `limit`,
    /// independent of the scheduler's per-task maximum.
    pub fn with_attach_limit(id: u32, priority: ThreadPriority, limit: usize) -> Arc<Self> {
        Self::build(id, priority, Some(limit))
    }

    fn build(id: u32, priority: ThreadPriority, attach_limit: Option<usize>) -> Arc<Self> {
        Arc::new_cyclic(|task: &Weak<SimTask>| Self {
            id,
            priority,
            attach_limit,
            page_table: Arc::new(SimPageTable {
                task: task.clone(),
            }),
            inner: Mutex::new(TaskInner {
                threads: Vec::new(),
                current: None,
                alive: true,
                kills: 0,
            }),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn thread_ids(&self) -> Vec<ThreadId> {
        self.inner.lock().threads.iter().map(|t| t.id()).collect()
    }

    pub fn is_alive(&self) -> bool {
        self.inner.lock().alive
    }

    /// How many times [`Task::kill`] was invoked.
    pub fn kill_count(&self) -> usize {
        self.inner.lock().kills
    }
}

impl Task for SimTask {
    fn thread_count(&self) -> usize {
        self.inner.lock().threads.len()
    }

    fn add_thread(&self, thread: &ThreadRef) -> Result<(), AttachError> {
        let mut inner = self.inner.lock();
        if !inner.alive {
            return Err(AttachError::TaskDead);
        }
        if let Some(limit) = self.attach_limit {
            if inner.threads.len() >= limit {
                return Err(AttachError::TaskFull(inner.threads.len()));
            }
        }
        inner.threads.push(Arc::clone(thread));
        Ok(())
    }

    fn remove_thread(&self, thread: &ThreadRef) {
        self.inner.lock().threads.retain(|t| t.id() != thread.id());
    }

    fn priority(&self) -> ThreadPriority {
        self.priority
    }

    fn set_current_thread(&self, thread: Option<ThreadRef>) {
        self.inner.lock().current = thread;
    }

    fn current_thread(&self) -> Option<ThreadRef> {
        self.inner.lock().current.clone()
    }

    fn page_table(&self) -> PageTableRef {
        self.page_table.clone()
    }

    fn kill(&self) {
        let mut inner = self.inner.lock();
        inner.alive = false;
        inner.kills += 1;
        inner.current = None;
        inner.threads.clear();
    }
}

/// Page table that only knows its owner.
pub struct SimPageTable {
    task: Weak<SimTask>,
}

impl PageTable for SimPageTable {
    fn task(&self) -> Option<TaskRef> {
        let task: TaskRef = self.task.upgrade()?;
        Some(task)
    }
}

/// Page-table base register.
#[derive(Default)]
pub struct SimMmu {
    ptbr: Mutex<Option<PageTableRef>>,
}

impl SimMmu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.ptbr.lock().is_some()
    }
}

impl Mmu for SimMmu {
    fn set_ptbr(&self, page_table: Option<PageTableRef>) {
        *self.ptbr.lock() = page_table;
    }

    fn ptbr(&self) -> Option<PageTableRef> {
        self.ptbr.lock().clone()
    }
}

/// Event with a FIFO wait list.
///
/// A thread appears once per wait cause, so a thread suspended twice on the
/// same event needs both entries notified before it is ready again.
#[derive(Default)]
pub struct WaitQueue {
    waiters: Mutex<Vec<ThreadRef>>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ThreadId) -> bool {
        self.waiters.lock().iter().any(|t| t.id() == id)
    }

    /// Entries held for `id`, one per wait cause.
    pub fn entries_for(&self, id: ThreadId) -> usize {
        self.waiters.lock().iter().filter(|t| t.id() == id).count()
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }

    /// Empties the wait list and resumes every waiter in arrival order.
    ///
    /// Returns how many resumes the scheduler accepted.
    pub fn notify_all(&self, scheduler: &Scheduler) -> usize {
        let waiters = std::mem::take(&mut *self.waiters.lock());
        waiters
            .iter()
            .filter(|thread| scheduler.resume(thread).is_ok())
            .count()
    }
}

impl Event for WaitQueue {
    fn add_thread(&self, thread: &ThreadRef) {
        self.waiters.lock().push(Arc::clone(thread));
    }
}

/// A device with a queue of block requests tagged by issuing thread.
#[derive(Default)]
pub struct SimDevice {
    pending: Mutex<Vec<(ThreadId, u64)>>,
}

impl SimDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, thread: ThreadId, block: u64) {
        self.pending.lock().push((thread, block));
    }

    pub fn pending_for(&self, thread: ThreadId) -> usize {
        self.pending.lock().iter().filter(|(id, _)| *id == thread).count()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Device for SimDevice {
    fn cancel_pending_io(&self, thread: &ThreadRef) {
        self.pending.lock().retain(|(id, _)| *id != thread.id());
    }
}

#[derive(Default)]
pub struct SimDeviceTable {
    devices: Vec<Arc<SimDevice>>,
}

impl SimDeviceTable {
    pub fn with_devices(count: usize) -> Self {
        Self {
            devices: (0..count).map(|_| Arc::new(SimDevice::new())).collect(),
        }
    }

    pub fn device(&self, index: usize) -> Option<&Arc<SimDevice>> {
        self.devices.get(index)
    }
}

impl DeviceTable for SimDeviceTable {
    fn len(&self) -> usize {
        self.devices.len()
    }

    fn get(&self, index: usize) -> Option<DeviceRef> {
        let device: DeviceRef = self.devices.get(index)?.clone();
        Some(device)
    }
}

/// Counting resource pool.
///
/// Threads that cannot acquire wait on an internal [`WaitQueue`]; whenever a
/// holder gives its units up, all waiters are resumed through the scheduler
/// the pool was attached to.
#[derive(Default)]
pub struct SimResources {
    held: Mutex<BTreeMap<ThreadId, u32>>,
    waiters: WaitQueue,
    scheduler: Mutex<Weak<Scheduler>>,
}

impl SimResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, scheduler: &Arc<Scheduler>) {
        *self.scheduler.lock() = Arc::downgrade(scheduler);
    }

    pub fn acquire(&self, thread: ThreadId, units: u32) {
        *self.held.lock().entry(thread).or_default() += units;
    }

    pub fn held_by(&self, thread: ThreadId) -> u32 {
        self.held.lock().get(&thread).copied().unwrap_or(0)
    }

    pub fn waiters(&self) -> &WaitQueue {
        &self.waiters
    }
}

impl ResourceManager for SimResources {
    fn giveup_resources(&self, thread: &ThreadRef) {
        let released = self.held.lock().remove(&thread.id());
        if released.is_none() {
            return;
        }

        let scheduler = self.scheduler.lock().upgrade();
        if let Some(scheduler) = scheduler {
            self.waiters.notify_all(&scheduler);
        }
    }
}

/// A fully wired simulated machine.
pub struct SimHarness {
    pub mmu: Arc<SimMmu>,
    pub timer: Arc<HardwareTimer>,
    pub devices: Arc<SimDeviceTable>,
    pub resources: Arc<SimResources>,
    pub scheduler: Arc<Scheduler>,
    next_task: Mutex<u32>,
}

impl SimHarness {
    pub fn new(config: SchedConfig) -> Self {
        Self::build(config, 2, None)
    }

    pub fn with_trace_hook(config: SchedConfig, hook: TraceHook) -> Self {
        Self::build(config, 2, Some(hook))
    }

    fn build(config: SchedConfig, devices: usize, trace: Option<TraceHook>) -> Self {
        let mmu = Arc::new(SimMmu::new());
        let timer = Arc::new(HardwareTimer::new());
        let devices = Arc::new(SimDeviceTable::with_devices(devices));
        let resources = Arc::new(SimResources::new());

        let platform = Platform::new(
            mmu.clone(),
            devices.clone(),
            resources.clone(),
            timer.clone(),
        );
        let mut builder = Scheduler::builder(platform).config(config);
        if let Some(hook) = trace {
            builder = builder.with_trace_hook(hook);
        }
        let scheduler = Arc::new(builder.build());
        resources.attach(&scheduler);

        Self {
            mmu,
            timer,
            devices,
            resources,
            scheduler,
            next_task: Mutex::new(0),
        }
    }

    pub fn new_task(&self, priority: ThreadPriority) -> Arc<SimTask> {
        let mut next = self.next_task.lock();
        *next += 1;
        SimTask::new(*next, priority)
    }

    /// Creates a thread in `task`, returning `None` on refusal.
    pub fn spawn(&self, task: &Arc<SimTask>) -> Option<ThreadRef> {
        let task: TaskRef = task.clone();
        self.scheduler.create_thread(Some(&task)).ok()
    }

    pub fn running(&self) -> Option<ThreadId> {
        self.scheduler.current_thread().map(|t| t.id())
    }

    pub fn machine(&self) -> Machine {
        Machine::new(Arc::clone(&self.scheduler), Arc::clone(&self.timer))
    }
}
