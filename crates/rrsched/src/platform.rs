//! Collaborator interfaces.
//!
//! The scheduler drives the rest of the simulated machine only through these
//! traits: tasks own threads and know their page table, the MMU holds the
//! processor binding, devices hold pending I/O, the resource manager holds
//! locks, events hold waiting threads and the timer counts down the quantum.
//! [`crate::sim`] has small implementations of each.

use crate::error::AttachError;
use crate::sync::Arc;
use crate::thread::{ThreadPriority, ThreadRef};

pub type TaskRef = Arc<dyn Task>;
pub type PageTableRef = Arc<dyn PageTable>;
pub type DeviceRef = Arc<dyn Device>;

/// A task: owner of threads and of one address space.
pub trait Task: Send + Sync {
    fn thread_count(&self) -> usize;

    /// Attaches `thread` to the task's thread collection.
    fn add_thread(&self, thread: &ThreadRef) -> Result<(), AttachError>;

    fn remove_thread(&self, thread: &ThreadRef);

    fn priority(&self) -> ThreadPriority;

    /// Records which of the task's threads is on the processor.
    fn set_current_thread(&self, thread: Option<ThreadRef>);

    fn current_thread(&self) -> Option<ThreadRef>;

    fn page_table(&self) -> PageTableRef;

    /// Terminates the task and everything it owns.
    fn kill(&self);
}

/// Address-translation context of a task.
pub trait PageTable: Send + Sync {
    /// Task owning this page table, if it still exists.
    fn task(&self) -> Option<TaskRef>;
}

/// Processor binding registry (the page-table base register).
pub trait Mmu: Send + Sync {
    fn set_ptbr(&self, page_table: Option<PageTableRef>);

    fn ptbr(&self) -> Option<PageTableRef>;
}

pub trait Device: Send + Sync {
    /// Drops every queued I/O request issued by `thread`.
    fn cancel_pending_io(&self, thread: &ThreadRef);
}

/// Enumerable device table.
pub trait DeviceTable: Send + Sync {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<DeviceRef>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait ResourceManager: Send + Sync {
    /// Releases every resource `thread` holds.
    fn giveup_resources(&self, thread: &ThreadRef);
}

/// A wait point threads can be suspended on.
pub trait Event: Send + Sync {
    fn add_thread(&self, thread: &ThreadRef);
}

/// One-shot countdown that ends in a timer interrupt.
pub trait Timer: Send + Sync {
    fn set(&self, ticks: u64);
}

/// The collaborators a scheduler is wired to.
#[derive(Clone)]
pub struct Platform {
    pub mmu: Arc<dyn Mmu>,
    pub devices: Arc<dyn DeviceTable>,
    pub resources: Arc<dyn ResourceManager>,
    pub timer: Arc<dyn Timer>,
}

impl Platform {
    pub fn new(
        mmu: Arc<dyn Mmu>,
        devices: Arc<dyn DeviceTable>,
        resources: Arc<dyn ResourceManager>,
        timer: Arc<dyn Timer>,
    ) -> Self {
        Self {
            mmu,
            devices,
            resources,
            timer,
        }
    }

    /// Yields every device in table order, skipping empty slots.
    pub fn devices(&self) -> impl Iterator<Item = DeviceRef> + '_ {
        (0..self.devices.len()).filter_map(move |index| self.devices.get(index))
    }
}
