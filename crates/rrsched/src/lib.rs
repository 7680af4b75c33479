//! # rrsched
//!
//! Thread scheduling core of a single-processor operating-system simulator:
//! thread lifecycle (create, kill, suspend, resume) and a round-robin
//! dispatcher driven by a one-shot quantum timer.
//!
//! ## Module Overview
//! - [`thread`]    – Thread control blocks and the tagged status machine.
//! - [`ready`]     – FIFO ready queue, the sole source of dispatch order.
//! - [`scheduler`] – Lifecycle operations and the dispatcher.
//! - [`interrupt`] – Timer interrupt handler (quantum expiry).
//! - [`platform`]  – Collaborator traits: task, MMU, devices, resources,
//!   events, timer.
//! - [`timer`]     – Simulated one-shot hardware timer.
//! - [`machine`]   – Simulated clock that delivers timer interrupts.
//! - [`sim`]       – Reference collaborators for harnesses and tests.
//!
//! Every lifecycle operation ends with a dispatch, so after any call the
//! processor runs the ready-queue head whenever one exists.

pub mod config;
pub mod error;
pub mod interrupt;
pub mod machine;
pub mod platform;
pub mod ready;
pub mod scheduler;
pub mod sim;
mod sync;
pub mod thread;
pub mod timer;
pub mod trace;

pub use config::{SchedConfig, SchedConfigBuilder};
pub use error::{AttachError, CreateError, SchedError};
pub use interrupt::TimerInterruptHandler;
pub use machine::Machine;
pub use platform::{
    Device, DeviceRef, DeviceTable, Event, Mmu, PageTable, PageTableRef, Platform,
    ResourceManager, Task, TaskRef, Timer,
};
pub use scheduler::{Dispatch, SchedSnapshot, Scheduler, SchedulerBuilder};
pub use thread::{ThreadCb, ThreadId, ThreadPriority, ThreadRef, ThreadStatus};
pub use timer::HardwareTimer;
pub use trace::{TraceError, TraceHook};

#[cfg(test)]
mod tests;
