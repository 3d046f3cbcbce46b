//! Cooperative completion waiting.
//!
//! Submitting a request or a response read returns immediately; the caller
//! then spins here, polling the session until the per-call `Completion` is
//! signalled or the timer runs out. An `InFlight` guard makes sure an
//! operation that did not complete is cancelled before its buffers go
//! away.

use core::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::transport::{Operation, Transport};
use crate::error::{NetworkError, Result};
use crate::http::status::is_redirection;
use crate::time::{Timer, TimerSource};

/// Completion slot for one submitted operation.
///
/// Signalled from the stack's completion notification; checked by the wait
/// loop. One slot per call, never shared between downloads.
#[derive(Debug, Default)]
pub struct Completion {
    done: AtomicBool,
}

impl Completion {
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    pub fn signal(&self) {
        self.done.store(true, Ordering::Release);
    }

    pub fn is_signaled(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

/// How a wait ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The completion was signalled.
    Completed,
    /// A redirect status showed up before any body; the read was abandoned.
    RedirectPending,
}

/// Guard for an operation submitted on a session.
///
/// Dropping the guard without `finish` cancels the operation.
pub struct InFlight<'t, T: Transport + ?Sized> {
    transport: &'t mut T,
    op: Operation,
    settled: bool,
}

impl<'t, T: Transport + ?Sized> InFlight<'t, T> {
    pub fn new(transport: &'t mut T, op: Operation) -> Self {
        Self {
            transport,
            op,
            settled: false,
        }
    }

    pub fn operation(&self) -> Operation {
        self.op
    }

    pub fn transport(&mut self) -> &mut T {
        &mut *self.transport
    }

    /// Release a completed operation, reporting its completion status.
    pub fn finish(mut self) -> Result<()> {
        self.settled = true;
        self.transport.finish(self.op)
    }

    /// Cancel now instead of at drop.
    pub fn cancel(mut self) {
        self.settled = true;
        self.transport.cancel(self.op);
    }
}

impl<T: Transport + ?Sized> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("cancelling unfinished {:?} operation", self.op);
            self.transport.cancel(self.op);
        }
    }
}

/// Poll until `completion` is signalled or `timeout_ms` elapses.
///
/// With `stop_on_redirect`, a response whose status is already known to be
/// a redirect ends the wait early: redirects carry no body worth waiting
/// for.
///
/// # Errors
///
/// `Timeout` when the budget is spent, or whatever `poll` reports.
pub fn wait_for_completion<T, C>(
    op: &mut InFlight<'_, T>,
    clock: &mut C,
    completion: &Completion,
    timeout_ms: u64,
    stop_on_redirect: bool,
) -> Result<WaitOutcome>
where
    T: Transport + ?Sized,
    C: TimerSource,
{
    let mut timer = clock.start(timeout_ms)?;

    loop {
        if completion.is_signaled() {
            return Ok(WaitOutcome::Completed);
        }
        if timer.expired() {
            debug!("{:?} wait timed out after {} ms", op.operation(), timeout_ms);
            return Err(NetworkError::Timeout);
        }

        op.transport().poll()?;

        if stop_on_redirect && op.transport().response_status().map_or(false, is_redirection) {
            if completion.is_signaled() {
                return Ok(WaitOutcome::Completed);
            }
            return Ok(WaitOutcome::RedirectPending);
        }
    }
}
