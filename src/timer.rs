use std::time::{Duration, Instant};

use tracing::trace;

/// Delay between two words at the given reading speed.
///
/// `wpm` of zero is treated as one so the delay is always finite.
pub fn word_interval(wpm: u32) -> Duration {
    Duration::from_micros(60_000_000 / u64::from(wpm.max(1)))
}

/// Running totals of what happened to a [`TimerSlot`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimerStats {
    pub armed: u64,
    pub cancelled: u64,
    pub fired: u64,
}

/// Holder for the single advancement timer a session may have outstanding.
///
/// Arming always cancels whatever was pending first, so there is never more
/// than one deadline. A cancelled deadline is gone: it can never fire.
#[derive(Debug, Default)]
pub struct TimerSlot {
    due: Option<Instant>,
    stats: TimerStats,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the next firing `delay` after `now`, replacing any pending one.
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.cancel();
        self.due = Some(now + delay);
        self.stats.armed += 1;
        trace!(delay_ms = delay.as_millis() as u64, "timer armed");
    }

    /// Drops the pending deadline, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        if self.due.take().is_some() {
            self.stats.cancelled += 1;
            trace!("timer cancelled");
            true
        } else {
            false
        }
    }

    /// Consumes the pending deadline if it has elapsed at `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                self.stats.fired += 1;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.due
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    pub fn stats(&self) -> TimerStats {
        self.stats
    }
}
