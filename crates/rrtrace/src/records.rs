//! Canonical record identifiers shared across the workspace.

/// Dispatcher records.
pub mod sched {
    /// A thread was bound to the processor. Payload: next id, previous id.
    pub const NEXT: u8 = 52;
    /// The processor went idle. Payload: previous id.
    pub const IDLE: u8 = 53;
    /// The running thread was preempted and requeued. Payload: thread id.
    pub const PREEMPT: u8 = 54;
}

/// Thread lifecycle records. Payload starts with the thread id.
pub mod thread {
    /// Thread created. Payload: thread id, priority.
    pub const CREATE: u8 = 70;
    /// Thread creation refused. Payload: reason code.
    pub const CREATE_FAILED: u8 = 71;
    /// Thread killed.
    pub const KILL: u8 = 72;
    /// Thread suspended. Payload: thread id, wait depth.
    pub const SUSPEND: u8 = 73;
    /// Thread resumed. Payload: thread id, remaining wait depth.
    pub const RESUME: u8 = 74;
}

/// Timer records.
pub mod timer {
    /// Quantum expired and the interrupt was delivered. Payload: clock.
    pub const EXPIRE: u8 = 33;
}
