//! Timers for the completion wait loop.
//!
//! The wait loop only needs to know whether its budget is spent. Firmware
//! builds back this with a timer event; anything with a millisecond clock can
//! use `timeout::MonotonicClock`.

pub mod timeout;

use crate::error::Result;

pub use timeout::{Deadline, MonotonicClock, DEFAULT_WAIT_TIMEOUT_MS};

/// A running one-shot timer.
pub trait Timer {
    /// Whether the timer has fired.
    fn expired(&mut self) -> bool;
}

/// Starts one-shot timers.
pub trait TimerSource {
    type Timer: Timer;

    /// Start a timer firing after `timeout_ms` milliseconds.
    fn start(&mut self, timeout_ms: u64) -> Result<Self::Timer>;
}
