//! Wait budget timers backed by firmware timer events.
//!
//! The completion wait loop must not stall; it polls the HTTP instance and
//! checks a one-shot relative timer event between polls.

use core::ptr;

use super::bindings::{
    status, BootServices, Event, EVT_TIMER, TIMER_CANCEL, TIMER_RELATIVE, TIMER_TICKS_PER_MS,
    TPL_CALLBACK,
};
use crate::error::{NetworkError, Result};
use crate::time::{Timer, TimerSource};

/// Convert milliseconds to SetTimer trigger units.
pub const fn timer_ticks(timeout_ms: u64) -> u64 {
    timeout_ms.saturating_mul(TIMER_TICKS_PER_MS)
}

/// Starts timer events.
pub struct EventTimers {
    bs: &'static BootServices,
}

impl EventTimers {
    /// # Safety
    ///
    /// `boot_services` must point to the firmware boot services table and
    /// stay valid for as long as timers are used.
    pub unsafe fn new(boot_services: *const BootServices) -> Result<Self> {
        let bs = boot_services
            .as_ref()
            .ok_or(NetworkError::InitializationFailed)?;
        Ok(Self { bs })
    }
}

impl TimerSource for EventTimers {
    type Timer = EventTimer;

    fn start(&mut self, timeout_ms: u64) -> Result<EventTimer> {
        let mut event: Event = ptr::null_mut();
        // SAFETY: boot services are valid for the lifetime of `self`.
        let st = unsafe { (self.bs.create_event)(EVT_TIMER, TPL_CALLBACK, None, ptr::null_mut(), &mut event) };
        status::check(st, NetworkError::InitializationFailed)?;

        let timer = EventTimer { bs: self.bs, event };
        // SAFETY: `event` was just created as a timer event.
        let st = unsafe { (self.bs.set_timer)(event, TIMER_RELATIVE, timer_ticks(timeout_ms)) };
        status::check(st, NetworkError::InitializationFailed)?;
        Ok(timer)
    }
}

/// A running one-shot timer event. Closed on drop.
pub struct EventTimer {
    bs: &'static BootServices,
    event: Event,
}

impl Timer for EventTimer {
    fn expired(&mut self) -> bool {
        // SAFETY: the event stays open until drop.
        unsafe { (self.bs.check_event)(self.event) == status::SUCCESS }
    }
}

impl Drop for EventTimer {
    fn drop(&mut self) {
        // SAFETY: the event is closed exactly once, here.
        unsafe {
            (self.bs.set_timer)(self.event, TIMER_CANCEL, 0);
            (self.bs.close_event)(self.event);
        }
    }
}
