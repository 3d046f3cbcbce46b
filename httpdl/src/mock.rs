//! Scripted network for host-side tests.
//!
//! `MockNetwork` hands out `MockSession`s that answer requests from a queue
//! of `Reply` scripts per interface, recording everything they are asked to
//! do in a shared `Journal`. `PollClock` is a timer source whose timers
//! expire after a fixed number of checks instead of wall-clock time.
//!
//! ```ignore
//! let network = MockNetwork::new()
//!     .with_nic(MockNic::ethernet().respond(ScriptedResponse::ok(b"hello")));
//! let mut downloader = Downloader::new(network, PollClock::new(100));
//! ```

use alloc::collections::VecDeque;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};

use crate::client::transport::{
    InterfaceProvider, Nic, Operation, ResponseMessage, SessionConfig, Transport,
};
use crate::client::wait::Completion;
use crate::error::{NetworkError, Result};
use crate::http::{Headers, Request};
use crate::time::{Timer, TimerSource};
use crate::types::HttpMethod;

// ═══════════════════════════════════════════════════════════════════════════
// Scripts
// ═══════════════════════════════════════════════════════════════════════════

/// A server response as the transport will deliver it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    /// Body bytes as they appear on the wire (chunk framing included).
    body: Vec<u8>,
    /// Largest number of body bytes handed out per read.
    read_size: Option<usize>,
    /// Polls before each operation completes.
    polls: usize,
    /// Response reads never complete; only the status becomes visible.
    hang: bool,
    /// Once this many body bytes are out, reads go silent: no completion,
    /// no status, nothing to take.
    stall_after: Option<usize>,
    /// Status reported when the first response read is finished.
    read_status: Option<NetworkError>,
}

impl ScriptedResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            read_size: None,
            polls: 1,
            hang: false,
            stall_after: None,
            read_status: None,
        }
    }

    /// 200 with `Content-Length` and `body`.
    pub fn ok(body: &[u8]) -> Self {
        Self::new(200)
            .header("Content-Length", &body.len().to_string())
            .body(body)
    }

    /// 200 announcing `length` bytes without carrying them (HEAD answers).
    pub fn probe(length: usize) -> Self {
        Self::new(200).header("Content-Length", &length.to_string())
    }

    /// 200 without any length information; the body ends when the stream
    /// does.
    pub fn streamed(body: &[u8]) -> Self {
        Self::new(200).body(body)
    }

    /// 200 with the body split into `parts` using chunked framing.
    pub fn chunked(parts: &[&[u8]]) -> Self {
        let mut wire = Vec::new();
        for part in parts {
            wire.extend_from_slice(format!("{:x}\r\n", part.len()).as_bytes());
            wire.extend_from_slice(part);
            wire.extend_from_slice(b"\r\n");
        }
        wire.extend_from_slice(b"0\r\n\r\n");
        Self::new(200)
            .header("Transfer-Encoding", "chunked")
            .body(&wire)
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self::new(status).header("Location", location)
    }

    /// Error status with a length-delimited body.
    pub fn error(status: u16, body: &[u8]) -> Self {
        Self::new(status)
            .header("Content-Length", &body.len().to_string())
            .body(body)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    pub fn read_size(mut self, read_size: usize) -> Self {
        self.read_size = Some(read_size);
        self
    }

    pub fn polls(mut self, polls: usize) -> Self {
        self.polls = polls.max(1);
        self
    }

    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Stop answering reads after `body_bytes` of the body; 0 withholds
    /// the headers too.
    pub fn stall_after(mut self, body_bytes: usize) -> Self {
        self.stall_after = Some(body_bytes);
        self
    }

    pub fn read_status(mut self, error: NetworkError) -> Self {
        self.read_status = Some(error);
        self
    }

    fn headers(&self) -> Result<Headers> {
        let mut headers = Headers::new();
        for (name, value) in &self.headers {
            headers.push(name.clone(), value.clone())?;
        }
        Ok(headers)
    }
}

/// How a session answers the next request submitted on an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Respond(ScriptedResponse),
    /// `submit_request` fails.
    SubmitError(NetworkError),
    /// The request is never sent.
    Stall,
    /// Every `poll` fails.
    PollError(NetworkError),
}

// ═══════════════════════════════════════════════════════════════════════════
// Journal
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub nic: String,
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedRead {
    pub window_len: usize,
    pub want_headers: bool,
}

/// Everything the scripted network was asked to do.
#[derive(Debug, Default)]
pub struct Journal {
    pub requests: Vec<RecordedRequest>,
    pub reads: Vec<RecordedRead>,
    pub cancels: Vec<Operation>,
    pub configs: Vec<SessionConfig>,
    pub prepared: Vec<String>,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
}

impl Journal {
    pub fn urls(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.url.as_str()).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Network and interfaces
// ═══════════════════════════════════════════════════════════════════════════

/// One scripted interface.
#[derive(Debug, Clone)]
pub struct MockNic {
    is_ethernet: bool,
    named: bool,
    replies: Rc<RefCell<VecDeque<Reply>>>,
    prepare_error: Option<NetworkError>,
    open_error: Option<NetworkError>,
    configure_error: Option<NetworkError>,
}

impl MockNic {
    fn with_type(is_ethernet: bool) -> Self {
        Self {
            is_ethernet,
            named: true,
            replies: Rc::new(RefCell::new(VecDeque::new())),
            prepare_error: None,
            open_error: None,
            configure_error: None,
        }
    }

    pub fn ethernet() -> Self {
        Self::with_type(true)
    }

    pub fn other() -> Self {
        Self::with_type(false)
    }

    /// An interface whose name cannot be determined.
    pub fn unnamed() -> Self {
        Self {
            named: false,
            ..Self::with_type(true)
        }
    }

    pub fn respond(self, response: ScriptedResponse) -> Self {
        self.reply(Reply::Respond(response))
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    pub fn failing_prepare(mut self, error: NetworkError) -> Self {
        self.prepare_error = Some(error);
        self
    }

    pub fn failing_open(mut self, error: NetworkError) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn failing_configure(mut self, error: NetworkError) -> Self {
        self.configure_error = Some(error);
        self
    }
}

/// Scripted interface provider.
#[derive(Debug, Default)]
pub struct MockNetwork {
    nics: Vec<MockNic>,
    journal: Rc<RefCell<Journal>>,
    enumerate_error: Option<NetworkError>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nic(mut self, nic: MockNic) -> Self {
        self.nics.push(nic);
        self
    }

    pub fn failing_enumeration(mut self, error: NetworkError) -> Self {
        self.enumerate_error = Some(error);
        self
    }

    pub fn journal(&self) -> Ref<'_, Journal> {
        self.journal.borrow()
    }

    fn nic(&self, nic: &Nic) -> Result<&MockNic> {
        self.nics.get(nic.index).ok_or(NetworkError::NotFound)
    }
}

impl InterfaceProvider for MockNetwork {
    type Session = MockSession;

    fn interfaces(&mut self) -> Result<Vec<Nic>> {
        if let Some(error) = &self.enumerate_error {
            return Err(error.clone());
        }
        Ok(self
            .nics
            .iter()
            .enumerate()
            .filter(|(_, nic)| nic.named)
            .map(|(index, nic)| Nic::new(index, nic.is_ethernet))
            .collect())
    }

    fn prepare_interface(&mut self, nic: &Nic) -> Result<()> {
        self.journal.borrow_mut().prepared.push(nic.name.clone());
        match &self.nic(nic)?.prepare_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn open_session(&mut self, nic: &Nic) -> Result<MockSession> {
        let scripted = self.nic(nic)?;
        if let Some(error) = &scripted.open_error {
            return Err(error.clone());
        }
        self.journal.borrow_mut().sessions_opened += 1;
        Ok(MockSession {
            nic: nic.name.clone(),
            journal: Rc::clone(&self.journal),
            replies: Rc::clone(&scripted.replies),
            configure_error: scripted.configure_error.clone(),
            poll_error: None,
            request: None,
            script: None,
            sent: 0,
            read: None,
            delivered: None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════════

struct PendingRequest {
    completion: *const Completion,
    /// Polls until the request is sent; `None` never sends it.
    polls_left: Option<usize>,
}

struct PendingRead {
    window: *mut u8,
    len: usize,
    want_headers: bool,
    completion: *const Completion,
    polls: usize,
    done: bool,
}

/// Session produced by `MockNetwork`.
pub struct MockSession {
    nic: String,
    journal: Rc<RefCell<Journal>>,
    replies: Rc<RefCell<VecDeque<Reply>>>,
    configure_error: Option<NetworkError>,
    poll_error: Option<NetworkError>,
    request: Option<PendingRequest>,
    script: Option<ScriptedResponse>,
    /// Body bytes already handed out.
    sent: usize,
    read: Option<PendingRead>,
    delivered: Option<ResponseMessage>,
}

impl MockSession {
    fn advance_request(&mut self) {
        let Some(pending) = self.request.as_mut() else {
            return;
        };
        if let Some(left) = pending.polls_left.as_mut() {
            *left = left.saturating_sub(1);
            if *left == 0 {
                pending.polls_left = None;
                // SAFETY: callers of `submit_request` keep the completion
                // alive until the request is finished or cancelled.
                unsafe { (*pending.completion).signal() };
            }
        }
    }

    fn advance_read(&mut self) -> Result<()> {
        let (Some(read), Some(script)) = (self.read.as_mut(), self.script.as_ref()) else {
            return Ok(());
        };
        let stalled = script.stall_after.map_or(false, |limit| self.sent >= limit);
        if read.done || stalled {
            return Ok(());
        }
        read.polls += 1;
        if script.hang || read.polls < script.polls {
            return Ok(());
        }

        let remaining = &script.body[self.sent..];
        let mut n = remaining.len().min(read.len);
        if let Some(limit) = script.read_size {
            n = n.min(limit);
        }
        if let Some(limit) = script.stall_after {
            n = n.min(limit - self.sent);
        }
        // SAFETY: callers of `submit_response` keep the window alive and
        // untouched until the read is finished or cancelled; `n` is
        // bounded by its length.
        unsafe { core::ptr::copy_nonoverlapping(remaining.as_ptr(), read.window, n) };
        self.sent += n;

        let mut message = ResponseMessage {
            body_length: n,
            ..ResponseMessage::default()
        };
        if read.want_headers {
            message.status_code = Some(script.status);
            message.headers = script.headers()?;
        }
        self.delivered = Some(message);
        read.done = true;
        // SAFETY: see `submit_response`.
        unsafe { (*read.completion).signal() };
        Ok(())
    }
}

impl Transport for MockSession {
    fn configure(&mut self, config: &SessionConfig) -> Result<()> {
        self.journal.borrow_mut().configs.push(*config);
        match &self.configure_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    unsafe fn submit_request(&mut self, request: &Request, completion: &Completion) -> Result<()> {
        self.journal.borrow_mut().requests.push(RecordedRequest {
            nic: self.nic.clone(),
            method: request.method(),
            url: request.url().to_string(),
            headers: request
                .headers()
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        });

        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .ok_or(NetworkError::ConnectionFailed)?;
        let polls_left = match reply {
            Reply::Respond(script) => {
                let polls = script.polls;
                self.script = Some(script);
                self.sent = 0;
                Some(polls)
            }
            Reply::SubmitError(error) => return Err(error),
            Reply::Stall => None,
            Reply::PollError(error) => {
                self.poll_error = Some(error);
                None
            }
        };
        self.request = Some(PendingRequest {
            completion,
            polls_left,
        });
        Ok(())
    }

    unsafe fn submit_response(
        &mut self,
        window: &mut [u8],
        want_headers: bool,
        completion: &Completion,
    ) -> Result<()> {
        self.journal.borrow_mut().reads.push(RecordedRead {
            window_len: window.len(),
            want_headers,
        });
        if self.script.is_none() {
            return Err(NetworkError::ReceiveFailed);
        }
        self.delivered = None;
        self.read = Some(PendingRead {
            window: window.as_mut_ptr(),
            len: window.len(),
            want_headers,
            completion,
            polls: 0,
            done: false,
        });
        Ok(())
    }

    fn poll(&mut self) -> Result<()> {
        if let Some(error) = &self.poll_error {
            return Err(error.clone());
        }
        self.advance_request();
        self.advance_read()
    }

    fn response_status(&self) -> Option<u16> {
        let read = self.read.as_ref()?;
        if read.polls == 0 {
            return None;
        }
        self.script.as_ref().map(|s| s.status)
    }

    fn take_response(&mut self) -> Result<ResponseMessage> {
        if let Some(message) = self.delivered.take() {
            return Ok(message);
        }
        match (&self.read, &self.script) {
            (Some(read), Some(script)) if read.want_headers && read.polls > 0 => {
                Ok(ResponseMessage {
                    status_code: Some(script.status),
                    headers: script.headers()?,
                    body_length: 0,
                })
            }
            _ => Err(NetworkError::ReceiveFailed),
        }
    }

    fn finish(&mut self, op: Operation) -> Result<()> {
        match op {
            Operation::Request => {
                self.request = None;
                Ok(())
            }
            Operation::Response => {
                self.read = None;
                match self.script.as_mut().and_then(|s| s.read_status.take()) {
                    Some(error) => Err(error),
                    None => Ok(()),
                }
            }
        }
    }

    fn cancel(&mut self, op: Operation) {
        self.journal.borrow_mut().cancels.push(op);
        match op {
            Operation::Request => self.request = None,
            Operation::Response => self.read = None,
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.journal.borrow_mut().sessions_closed += 1;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Clock
// ═══════════════════════════════════════════════════════════════════════════

/// Timer source counting expiry checks instead of time.
///
/// Clones share their counters.
#[derive(Debug, Clone)]
pub struct PollClock {
    max_checks: usize,
    checks: Rc<Cell<usize>>,
    last_timeout_ms: Rc<Cell<u64>>,
}

impl PollClock {
    /// Timers report expiry on the check after `max_checks` checks.
    pub fn new(max_checks: usize) -> Self {
        Self {
            max_checks,
            checks: Rc::new(Cell::new(0)),
            last_timeout_ms: Rc::new(Cell::new(0)),
        }
    }

    /// Expiry checks made across all timers.
    pub fn checks(&self) -> usize {
        self.checks.get()
    }

    /// Budget requested by the most recent `start`.
    pub fn last_timeout_ms(&self) -> u64 {
        self.last_timeout_ms.get()
    }
}

pub struct PollTimer {
    remaining: usize,
    checks: Rc<Cell<usize>>,
}

impl Timer for PollTimer {
    fn expired(&mut self) -> bool {
        self.checks.set(self.checks.get() + 1);
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}

impl TimerSource for PollClock {
    type Timer = PollTimer;

    fn start(&mut self, timeout_ms: u64) -> Result<PollTimer> {
        self.last_timeout_ms.set(timeout_ms);
        Ok(PollTimer {
            remaining: self.max_checks,
            checks: Rc::clone(&self.checks),
        })
    }
}
