//! Millisecond-clock deadlines.

use super::{Timer, TimerSource};
use crate::error::Result;

/// Budget for one request or response completion (10 seconds).
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Timer source backed by a function returning the current time in
/// milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    get_time_ms: fn() -> u64,
}

impl MonotonicClock {
    pub fn new(get_time_ms: fn() -> u64) -> Self {
        Self { get_time_ms }
    }

    pub fn now(&self) -> u64 {
        (self.get_time_ms)()
    }
}

/// Deadline on a `MonotonicClock`.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    get_time_ms: fn() -> u64,
    at_ms: u64,
}

impl Deadline {
    pub fn remaining_ms(&self) -> u64 {
        self.at_ms.saturating_sub((self.get_time_ms)())
    }
}

impl Timer for Deadline {
    fn expired(&mut self) -> bool {
        (self.get_time_ms)() >= self.at_ms
    }
}

impl TimerSource for MonotonicClock {
    type Timer = Deadline;

    fn start(&mut self, timeout_ms: u64) -> Result<Deadline> {
        Ok(Deadline {
            get_time_ms: self.get_time_ms,
            at_ms: self.now().saturating_add(timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU64, Ordering};

    static NOW: AtomicU64 = AtomicU64::new(0);

    fn fake_now() -> u64 {
        NOW.load(Ordering::SeqCst)
    }

    #[test]
    fn test_deadline_expires() {
        NOW.store(1_000, Ordering::SeqCst);
        let mut clock = MonotonicClock::new(fake_now);
        let mut deadline = clock.start(500).unwrap();

        assert!(!deadline.expired());
        assert_eq!(deadline.remaining_ms(), 500);

        NOW.store(1_499, Ordering::SeqCst);
        assert!(!deadline.expired());

        NOW.store(1_500, Ordering::SeqCst);
        assert!(deadline.expired());
        assert_eq!(deadline.remaining_ms(), 0);
    }
}
