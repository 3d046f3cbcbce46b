//! `Transport` over the EFI HTTP protocol.
//!
//! Each submitted operation owns a boxed token/message block so the
//! addresses handed to firmware stay put until the operation is finished
//! or cancelled. Completion is reported through a notify event whose
//! context is the caller's `Completion` slot.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::ptr;

use tracing::debug;

use super::bindings::{
    status, BootServices, Event, Handle, HttpHeader, HttpMessage, HttpMessageData, HttpMethod,
    HttpProtocol, HttpRequestData, HttpResponseData, HttpStatusCode, HttpToken, EVT_NOTIFY_SIGNAL,
    TPL_CALLBACK,
};
use super::manager::ProtocolManager;
use crate::client::{Completion, Operation, ResponseMessage, SessionConfig, Transport};
use crate::error::{NetworkError, Result};
use crate::http::{Headers, Request};
use crate::utils::string::{c_str_to_string, try_ascii_to_utf16, try_to_c_string};

/// Notify function for operation events: marks the context's slot done.
unsafe extern "efiapi" fn signal_completion(_event: Event, context: *mut c_void) {
    if let Some(completion) = (context as *const Completion).as_ref() {
        completion.signal();
    }
}

/// Request block handed to firmware.
struct RequestState {
    token: HttpToken,
    message: HttpMessage,
    data: HttpRequestData,
    /// Null-terminated UTF-16 URL.
    url: Vec<u16>,
    /// Null-terminated name and value strings, pairwise. `headers` points
    /// into these.
    #[allow(dead_code)]
    fields: Vec<Vec<u8>>,
    headers: Vec<HttpHeader>,
}

impl RequestState {
    fn build(request: &Request) -> Result<Box<Self>> {
        let url = try_ascii_to_utf16(request.url())?;

        let count = request.headers().len();
        let mut fields: Vec<Vec<u8>> = Vec::new();
        fields
            .try_reserve_exact(count * 2)
            .map_err(|_| NetworkError::OutOfMemory)?;
        for (name, value) in request.headers().iter() {
            fields.push(try_to_c_string(name)?);
            fields.push(try_to_c_string(value)?);
        }

        let mut headers: Vec<HttpHeader> = Vec::new();
        headers
            .try_reserve_exact(count)
            .map_err(|_| NetworkError::OutOfMemory)?;
        for pair in fields.chunks_exact(2) {
            headers.push(HttpHeader {
                field_name: pair[0].as_ptr(),
                field_value: pair[1].as_ptr(),
            });
        }

        let mut state = Box::new(Self {
            token: HttpToken {
                event: ptr::null_mut(),
                status: status::SUCCESS,
                message: ptr::null_mut(),
            },
            message: HttpMessage {
                data: HttpMessageData {
                    request: ptr::null_mut(),
                },
                header_count: 0,
                headers: ptr::null_mut(),
                body_length: 0,
                body: ptr::null_mut(),
            },
            data: HttpRequestData {
                method: HttpMethod::from_types_method(request.method()),
                url: ptr::null(),
            },
            url,
            fields,
            headers,
        });

        let block = &mut *state;
        block.data.url = block.url.as_ptr();
        block.message.data.request = &mut block.data;
        block.message.header_count = block.headers.len();
        block.message.headers = block.headers.as_mut_ptr();
        block.token.message = &mut block.message;
        Ok(state)
    }
}

/// Response read block handed to firmware.
struct ResponseState {
    token: HttpToken,
    message: HttpMessage,
    data: HttpResponseData,
    want_headers: bool,
    /// Signalled when the token completes.
    completion: *const Completion,
}

impl ResponseState {
    fn build(window: &mut [u8], want_headers: bool) -> Box<Self> {
        let mut state = Box::new(Self {
            token: HttpToken {
                event: ptr::null_mut(),
                status: status::SUCCESS,
                message: ptr::null_mut(),
            },
            message: HttpMessage {
                data: HttpMessageData {
                    response: ptr::null_mut(),
                },
                header_count: 0,
                headers: ptr::null_mut(),
                body_length: window.len(),
                body: window.as_mut_ptr(),
            },
            data: HttpResponseData {
                status_code: HttpStatusCode::UNSUPPORTED,
            },
            want_headers,
            completion: ptr::null(),
        });

        let block = &mut *state;
        if want_headers {
            block.message.data.response = &mut block.data;
        }
        block.token.message = &mut block.message;
        state
    }

    /// Body bytes written into the window.
    ///
    /// Until the token completes the field still holds the window size, so
    /// an unfinished read reports nothing.
    fn received(&self) -> usize {
        // SAFETY: `completion` is null or outlives the block, per the
        // `submit_response` contract.
        let done = unsafe { self.completion.as_ref() }.map_or(false, Completion::is_signaled);
        if !done {
            return 0;
        }
        // SAFETY: plain field read of a block owned by this session.
        unsafe { ptr::read_volatile(&self.message.body_length) }
    }

    /// Current status index, as written by firmware.
    fn status_code(&self) -> HttpStatusCode {
        // SAFETY: plain field read; firmware may update it between polls.
        unsafe { ptr::read_volatile(&self.data.status_code) }
    }
}

/// One HTTP session on one interface.
pub struct UefiSession {
    bs: &'static BootServices,
    manager: ProtocolManager,
    request: Option<Box<RequestState>>,
    response: Option<Box<ResponseState>>,
}

impl UefiSession {
    /// Open an HTTP child on `controller`.
    ///
    /// # Safety
    ///
    /// `controller` and `image` must be valid handles and boot services
    /// must not have been exited.
    pub unsafe fn open(bs: &'static BootServices, image: Handle, controller: Handle) -> Result<Self> {
        Ok(Self {
            bs,
            manager: ProtocolManager::open(bs, image, controller)?,
            request: None,
            response: None,
        })
    }

    fn http(&self) -> Result<*mut HttpProtocol> {
        self.manager.http_protocol()
    }

    /// Create the notify event for one operation.
    unsafe fn completion_event(&self, completion: &Completion, failure: NetworkError) -> Result<Event> {
        let mut event: Event = ptr::null_mut();
        let st = (self.bs.create_event)(
            EVT_NOTIFY_SIGNAL,
            TPL_CALLBACK,
            Some(signal_completion),
            completion as *const Completion as *mut c_void,
            &mut event,
        );
        status::check(st, failure)?;
        Ok(event)
    }

    fn close_event(&self, event: Event) {
        if !event.is_null() {
            // SAFETY: the event was created by `completion_event` and is
            // closed exactly once.
            unsafe {
                (self.bs.close_event)(event);
            }
        }
    }

    /// Return a firmware-allocated header array to the pool.
    fn free_headers(&self, message: &mut HttpMessage) {
        // SAFETY: firmware allocated the array from pool; the pointer is
        // cleared so it is never freed twice.
        unsafe {
            let headers = ptr::read_volatile(&message.headers);
            if !headers.is_null() {
                (self.bs.free_pool)(headers as *mut c_void);
                message.headers = ptr::null_mut();
                message.header_count = 0;
            }
        }
    }

    /// Cancel and drop the block of `op`, if any.
    fn abandon(&mut self, op: Operation) {
        let Ok(http) = self.http() else {
            return;
        };
        match op {
            Operation::Request => {
                if let Some(mut state) = self.request.take() {
                    // SAFETY: the token is the one queued by `submit_request`.
                    unsafe {
                        ((*http).cancel)(http, &mut state.token);
                    }
                    self.close_event(state.token.event);
                }
            }
            Operation::Response => {
                if let Some(mut state) = self.response.take() {
                    // SAFETY: the token is the one queued by `submit_response`.
                    unsafe {
                        ((*http).cancel)(http, &mut state.token);
                    }
                    self.close_event(state.token.event);
                    self.free_headers(&mut state.message);
                }
            }
        }
    }
}

impl Transport for UefiSession {
    fn configure(&mut self, config: &SessionConfig) -> Result<()> {
        self.manager.configure(config)
    }

    unsafe fn submit_request(&mut self, request: &Request, completion: &Completion) -> Result<()> {
        let http = self.http()?;
        self.abandon(Operation::Request);

        let mut state = RequestState::build(request)?;
        state.token.event = self.completion_event(completion, NetworkError::ConnectionFailed)?;

        let st = ((*http).request)(http, &mut state.token);
        if let Err(e) = status::check(st, NetworkError::ConnectionFailed) {
            debug!("Request() rejected: {:#x}", st);
            self.close_event(state.token.event);
            return Err(e);
        }
        self.request = Some(state);
        Ok(())
    }

    unsafe fn submit_response(
        &mut self,
        window: &mut [u8],
        want_headers: bool,
        completion: &Completion,
    ) -> Result<()> {
        let http = self.http()?;
        self.abandon(Operation::Response);

        let mut state = ResponseState::build(window, want_headers);
        state.completion = completion;
        state.token.event = self.completion_event(completion, NetworkError::ReceiveFailed)?;

        let st = ((*http).response)(http, &mut state.token);
        if let Err(e) = status::check(st, NetworkError::ReceiveFailed) {
            debug!("Response() rejected: {:#x}", st);
            self.close_event(state.token.event);
            return Err(e);
        }
        self.response = Some(state);
        Ok(())
    }

    fn poll(&mut self) -> Result<()> {
        let http = self.http()?;
        // SAFETY: `http` belongs to the configured child owned by `manager`.
        let st = unsafe { ((*http).poll)(http) };
        match st {
            status::SUCCESS | status::NOT_READY | status::TIMEOUT => Ok(()),
            other => {
                debug!("Poll() failed: {:#x}", other);
                Err(NetworkError::ReceiveFailed)
            }
        }
    }

    fn response_status(&self) -> Option<u16> {
        self.response
            .as_ref()
            .filter(|state| state.want_headers)
            .and_then(|state| state.status_code().to_code())
    }

    fn take_response(&mut self) -> Result<ResponseMessage> {
        let bs = self.bs;
        let state = self.response.as_mut().ok_or(NetworkError::ReceiveFailed)?;

        let mut message = ResponseMessage {
            status_code: None,
            headers: Headers::new(),
            body_length: state.received(),
        };
        if !state.want_headers {
            return Ok(message);
        }
        message.status_code = state.status_code().to_code();

        // SAFETY: firmware fills `headers`/`header_count` with a pool array
        // of null-terminated strings before it completes the token.
        unsafe {
            let headers = ptr::read_volatile(&state.message.headers);
            let count = ptr::read_volatile(&state.message.header_count);
            if !headers.is_null() {
                let copied = copy_headers(headers, count, &mut message.headers);
                (bs.free_pool)(headers as *mut c_void);
                state.message.headers = ptr::null_mut();
                state.message.header_count = 0;
                copied?;
            }
        }
        Ok(message)
    }

    fn finish(&mut self, op: Operation) -> Result<()> {
        match op {
            Operation::Request => {
                let state = self.request.take().ok_or(NetworkError::ConnectionFailed)?;
                // SAFETY: the token has completed; firmware no longer writes it.
                let st = unsafe { ptr::read_volatile(&state.token.status) };
                self.close_event(state.token.event);
                status::check(st, NetworkError::ConnectionFailed)
            }
            Operation::Response => {
                let mut state = self.response.take().ok_or(NetworkError::ReceiveFailed)?;
                // SAFETY: as above.
                let st = unsafe { ptr::read_volatile(&state.token.status) };
                self.close_event(state.token.event);
                self.free_headers(&mut state.message);
                status::check(st, NetworkError::ReceiveFailed)
            }
        }
    }

    fn cancel(&mut self, op: Operation) {
        self.abandon(op);
    }
}

impl Drop for UefiSession {
    fn drop(&mut self) {
        self.abandon(Operation::Request);
        self.abandon(Operation::Response);
    }
}

/// Copy `count` firmware headers into `out`.
///
/// # Safety
///
/// `headers` must point to `count` valid `HttpHeader` entries.
unsafe fn copy_headers(headers: *const HttpHeader, count: usize, out: &mut Headers) -> Result<()> {
    for header in core::slice::from_raw_parts(headers, count) {
        let name: String = c_str_to_string(header.field_name)?;
        let value: String = c_str_to_string(header.field_value)?;
        out.push(name, value)?;
    }
    Ok(())
}

// ==================== Tests ====================
