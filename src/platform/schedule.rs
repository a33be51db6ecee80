//! Fixed-period tick deadlines
//!
//! Ticks are due every `period`. A tick that finishes after the following
//! deadline has already passed re-anchors the schedule to the moment it
//! finished: the next tick runs at once, and the missed ones are dropped
//! rather than replayed in a burst.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct TickSchedule {
    period: Duration,
    next_deadline: Duration,
    overruns: u64,
}

impl TickSchedule {
    /// First tick is due one period after `start`
    pub fn new(period: Duration, start: Duration) -> Self {
        Self {
            period,
            next_deadline: start + period,
            overruns: 0,
        }
    }

    pub fn next_deadline(&self) -> Duration {
        self.next_deadline
    }

    /// Ticks that finished late so far
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.next_deadline
    }

    /// Time left until the next tick is due
    pub fn wait_time(&self, now: Duration) -> Duration {
        self.next_deadline.saturating_sub(now)
    }

    /// Record that the due tick finished at `now`. Returns true on overrun.
    pub fn complete(&mut self, now: Duration) -> bool {
        self.next_deadline += self.period;
        if now > self.next_deadline {
            self.overruns += 1;
            log::debug!(
                "Tick overran by {:?}, re-anchoring",
                now - self.next_deadline
            );
            self.next_deadline = now;
            return true;
        }
        false
    }
}
