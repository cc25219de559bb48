//! Recurring gravity timer driven by the caller's clock.

use std::time::{Duration, Instant};

/// A repeating timer. Either disarmed, or armed with a fixed period and the next due instant.
/// Changing the period means cancelling and arming a new one; there is no in-place update.
#[derive(Debug, Clone, Default)]
pub struct DropTimer {
    armed: Option<Armed>,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    period: Duration,
    next_due: Instant,
}

impl DropTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm with `period`; the first fire is one full period after `now`.
    pub fn start(&mut self, now: Instant, period: Duration) {
        self.armed = Some(Armed {
            period,
            next_due: now + period,
        });
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn period(&self) -> Option<Duration> {
        self.armed.map(|a| a.period)
    }

    #[cfg(test)]
    pub fn next_due(&self) -> Option<Instant> {
        self.armed.map(|a| a.next_due)
    }

    /// Time left until the next fire, zero if overdue, `None` when disarmed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.armed
            .map(|a| a.next_due.saturating_duration_since(now))
    }

    /// True once per elapsed period. A late poll fires once and restarts the period from `now`
    /// so a stalled loop does not replay a burst of missed ticks.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.armed.as_mut() {
            Some(a) if now >= a.next_due => {
                let on_schedule = a.next_due + a.period;
                a.next_due = if on_schedule > now { on_schedule } else { now + a.period };
                true
            }
            _ => false,
        }
    }
}
