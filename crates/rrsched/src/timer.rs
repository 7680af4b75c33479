//! Simulated hardware timer.
//!
//! A single one-shot countdown measured in simulated ticks. The dispatcher
//! arms it through [`Timer::set`]; whoever drives the clock calls
//! [`HardwareTimer::tick`] and delivers the timer interrupt when it reports
//! expiry.

use crate::platform::Timer;
use crate::sync::Mutex;

#[derive(Default)]
struct TimerInner {
    remaining: u64,
    armed: bool,
    arms: u64,
}

#[derive(Default)]
pub struct HardwareTimer {
    inner: Mutex<TimerInner>,
}

impl HardwareTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the countdown by one tick.
    ///
    /// Returns `true` exactly once per arming, on the tick the countdown
    /// reaches zero; the timer is disarmed afterwards.
    pub fn tick(&self) -> bool {
        let mut inner = self.inner.lock();
        if !inner.armed {
            return false;
        }

        inner.remaining = inner.remaining.saturating_sub(1);
        if inner.remaining == 0 {
            inner.armed = false;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().armed
    }

    /// Ticks left before expiry, `None` when disarmed.
    pub fn remaining(&self) -> Option<u64> {
        let inner = self.inner.lock();
        inner.armed.then_some(inner.remaining)
    }

    /// Number of times the timer has been armed.
    pub fn arm_count(&self) -> u64 {
        self.inner.lock().arms
    }

    pub fn disarm(&self) {
        let mut inner = self.inner.lock();
        inner.armed = false;
        inner.remaining = 0;
    }
}

impl Timer for HardwareTimer {
    /// Arms the countdown, replacing any previous one. Zero ticks disarms.
    fn set(&self, ticks: u64) {
        let mut inner = self.inner.lock();
        inner.remaining = ticks;
        inner.armed = ticks > 0;
        if inner.armed {
            inner.arms += 1;
        }
    }
}
