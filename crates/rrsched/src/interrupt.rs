//! Timer interrupt handler.

use crate::scheduler::{Dispatch, Scheduler};
use crate::sync::Arc;

/// Reacts to quantum expiry by re-running the dispatcher, nothing more.
#[derive(Clone)]
pub struct TimerInterruptHandler {
    scheduler: Arc<Scheduler>,
}

impl TimerInterruptHandler {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    pub fn handle_interrupt(&self) -> Dispatch {
        self.scheduler.dispatch()
    }
}
