//! Host clocks for pacing the virtual machine.
use std::{
    thread,
    time::{Duration, Instant},
};

use chip8::constants::NANOS_IN_SECOND;
use serde::Deserialize;

/// Clock frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Timer to synchronize the host thread with a fixed rate clock.
///
/// It is designed to work with the yielding cooperative pattern
/// of the run loop. When the VM yields control back to the
/// caller, time elapses until it is resumed. Once the loop
/// is resumed, the elapsed time is taken into account when determining
/// the next cycle.
pub struct Clock {
    interval: Duration,
    last: Instant,
}

impl Clock {
    /// Creates a new clock with the current time as internal state.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.last = Instant::now()
    }

    /// Check whether a full cycle has elapsed, starting the next one if so.
    pub fn tick(&mut self) -> bool {
        if self.last.elapsed() >= self.interval {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Block the current thread until the next clock cycle.
    pub fn wait(&mut self) {
        loop {
            if self.last.elapsed() < self.interval {
                // Sleep does not have enough resolution, and causes
                // the clock to run at 30 FPS.
                //
                // Spinning a loop causes high CPU usage and fan madness.
                //
                // Yielding in a loop is the best alternative.
                thread::yield_now();
            } else {
                // Reset back to zero, rather than trying to catch up.
                //
                // If the VM was paused for debugging, and a large
                // amount of time has elapsed until it is resumed,
                // it should simply continue at the next cycle running
                // at its usual speed.
                self.reset();
                return;
            }
        }
    }
}
