//! Simulated clock driving the timer interrupt.

use crate::interrupt::TimerInterruptHandler;
use crate::scheduler::{Dispatch, Scheduler};
use crate::sync::Arc;
use crate::timer::HardwareTimer;
use crate::trace::{records, TraceHook};

/// Couples a scheduler with the hardware timer it arms.
///
/// The timer passed here must be the one the scheduler's platform uses,
/// otherwise quanta are armed on a clock nobody ticks.
pub struct Machine {
    scheduler: Arc<Scheduler>,
    timer: Arc<HardwareTimer>,
    interrupts: TimerInterruptHandler,
    clock: u64,
    trace: Option<TraceHook>,
}

impl Machine {
    pub fn new(scheduler: Arc<Scheduler>, timer: Arc<HardwareTimer>) -> Self {
        let interrupts = TimerInterruptHandler::new(Arc::clone(&scheduler));
        Self {
            scheduler,
            timer,
            interrupts,
            clock: 0,
            trace: None,
        }
    }

    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn timer(&self) -> &Arc<HardwareTimer> {
        &self.timer
    }

    /// Simulated ticks elapsed so far.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Advances one tick, delivering the timer interrupt on expiry.
    pub fn tick(&mut self) -> Option<Dispatch> {
        self.clock += 1;
        if !self.timer.tick() {
            return None;
        }

        log::trace!("quantum expired at tick {}", self.clock);
        if let Some(trace) = &self.trace {
            let clock = self.clock.min(u64::from(u32::MAX)) as u32;
            let _ = trace(records::timer::EXPIRE, &clock.to_le_bytes(), true);
        }
        Some(self.interrupts.handle_interrupt())
    }

    /// Runs `ticks` ticks and returns every dispatch caused by an interrupt.
    pub fn advance(&mut self, ticks: u64) -> Vec<Dispatch> {
        (0..ticks).filter_map(|_| self.tick()).collect()
    }

    /// Runs until the next interrupt, giving up after `limit` ticks.
    pub fn run_quantum(&mut self, limit: u64) -> Option<Dispatch> {
        (0..limit).find_map(|_| self.tick())
    }
}
