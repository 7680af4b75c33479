use thiserror::Error;

use crate::thread::{ThreadId, ThreadStatus};

/// Why a task refused to take a new thread.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("task already holds {0} threads")]
    TaskFull(usize),
    #[error("task has been killed")]
    TaskDead,
}

/// Why thread creation produced no thread.
///
/// The scheduler dispatches before returning any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreateError {
    #[error("no task given")]
    NoTask,
    #[error("task already holds {count} threads (limit {max})")]
    TaskFull { count: usize, max: usize },
    #[error("task rejected the thread: {0}")]
    AttachRejected(#[from] AttachError),
}

impl CreateError {
    /// Stable code carried in trace records.
    pub fn code(&self) -> u32 {
        match self {
            Self::NoTask => 1,
            Self::TaskFull { .. } => 2,
            Self::AttachRejected(_) => 3,
        }
    }
}

/// A lifecycle operation whose precondition did not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    #[error("attempt to resume {id}, which wasn't waiting (status {status})")]
    NotWaiting { id: ThreadId, status: ThreadStatus },
    #[error("cannot suspend {id} while {status}")]
    NotSuspendable { id: ThreadId, status: ThreadStatus },
    #[error("thread {0} has already been killed")]
    Killed(ThreadId),
}
