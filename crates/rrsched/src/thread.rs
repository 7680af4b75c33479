//! Thread control blocks.
//!
//! A thread is the unit of scheduling. It belongs to exactly one task, copies
//! that task's priority when created, and moves through the states of
//! [`ThreadStatus`] under the lifecycle operations of the
//! [`Scheduler`](crate::Scheduler). The control block itself never changes
//! state on its own; only the scheduler writes its status.

use core::fmt;

use crate::platform::TaskRef;
use crate::sync::{Arc, Mutex};

/// Thread identifier, unique within one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreadId(pub u32);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Priority inherited from the owning task.
///
/// Carried for the benefit of collaborators; the ready queue ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreadPriority(pub u8);

/// Thread execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThreadStatus {
    /// Runnable and parked on the ready queue.
    Ready,
    /// Bound to the processor.
    Running,
    /// Suspended on `depth` stacked events; `depth` is never zero.
    Waiting(u32),
    /// Terminal.
    Killed,
}

impl ThreadStatus {
    pub fn is_waiting(self) -> bool {
        matches!(self, Self::Waiting(_))
    }

    /// Number of events the thread still waits on, zero when not waiting.
    pub fn wait_depth(self) -> u32 {
        match self {
            Self::Waiting(depth) => depth,
            _ => 0,
        }
    }

    /// Status after one more concurrent wait cause.
    ///
    /// Returns `None` for states that cannot be stacked (`Ready`, `Killed`).
    pub fn deepen(self) -> Option<Self> {
        match self {
            Self::Running => Some(Self::Waiting(1)),
            Self::Waiting(depth) => Some(Self::Waiting(depth.saturating_add(1))),
            Self::Ready | Self::Killed => None,
        }
    }

    /// Status after one wait cause completes; `None` when not waiting.
    pub fn unwind(self) -> Option<Self> {
        match self {
            Self::Waiting(1) => Some(Self::Ready),
            Self::Waiting(depth) if depth > 1 => Some(Self::Waiting(depth - 1)),
            _ => None,
        }
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Running => write!(f, "running"),
            Self::Waiting(depth) => write!(f, "waiting({depth})"),
            Self::Killed => write!(f, "killed"),
        }
    }
}

/// Shared handle to a thread.
///
/// The owning task keeps the strong reference that matters; the ready queue
/// and event wait lists hold clones while the thread is parked there.
pub type ThreadRef = Arc<ThreadCb>;

/// A thread control block.
pub struct ThreadCb {
    id: ThreadId,
    task: TaskRef,
    priority: ThreadPriority,
    status: Mutex<ThreadStatus>,
}

impl ThreadCb {
    pub(crate) fn new(id: ThreadId, task: TaskRef, priority: ThreadPriority) -> ThreadRef {
        Arc::new(Self {
            id,
            task,
            priority,
            status: Mutex::new(ThreadStatus::Ready),
        })
    }

    /// Returns the thread ID.
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns the owning task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    pub fn priority(&self) -> ThreadPriority {
        self.priority
    }

    /// Returns the current thread status.
    pub fn status(&self) -> ThreadStatus {
        *self.status.lock()
    }

    pub fn is_ready(&self) -> bool {
        self.status() == ThreadStatus::Ready
    }

    pub fn is_running(&self) -> bool {
        self.status() == ThreadStatus::Running
    }

    pub fn is_killed(&self) -> bool {
        self.status() == ThreadStatus::Killed
    }

    pub(crate) fn set_status(&self, status: ThreadStatus) {
        debug_assert!(status != ThreadStatus::Waiting(0), "wait depth must be positive");
        *self.status.lock() = status;
    }
}

impl PartialEq for ThreadCb {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ThreadCb {}

impl fmt::Debug for ThreadCb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadCb")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("status", &self.status())
            .finish()
    }
}

impl fmt::Display for ThreadCb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.status())
    }
}
