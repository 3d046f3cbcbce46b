//! Transport seam between the download state machine and the network stack.
//!
//! A `Transport` is one HTTP session bound to one network interface. An
//! `InterfaceProvider` enumerates interfaces, prepares their addressing and
//! opens sessions on them. Firmware implementations live in
//! `protocol::uefi`; tests use the scripted ones in `mock`.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use smoltcp::wire::Ipv4Cidr;

use super::wait::Completion;
use crate::error::Result;
use crate::http::{Headers, Request};

/// In-flight operation kinds on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Request,
    Response,
}

/// Session parameters applied by `Transport::configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Protocol-level timeout in milliseconds (0 = stack default).
    pub timeout_ms: u32,
    /// Local port (0 = ephemeral).
    pub local_port: u16,
    /// Static station address; `None` uses the interface default.
    pub local_address: Option<Ipv4Cidr>,
}

/// What one completed response read produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMessage {
    /// Status code, present on the read that delivered the headers.
    pub status_code: Option<u16>,
    /// Header fields (empty on body-only reads).
    pub headers: Headers,
    /// Number of body bytes written into the read window.
    pub body_length: usize,
}

impl ResponseMessage {
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }
}

/// One HTTP session on one interface.
///
/// Lifecycle: open, `configure`, then any number of request/response
/// exchanges; dropping the session closes it.
pub trait Transport {
    /// Apply session parameters. Must be called once before any request.
    fn configure(&mut self, config: &SessionConfig) -> Result<()>;

    /// Queue `request`; `completion` is signalled when it has been sent.
    ///
    /// # Safety
    ///
    /// `completion` must stay alive and in place until the request
    /// operation is finished or cancelled.
    unsafe fn submit_request(&mut self, request: &Request, completion: &Completion) -> Result<()>;

    /// Queue a response read into `window`; `completion` is signalled when
    /// data (or headers, when `want_headers`) is available.
    ///
    /// # Safety
    ///
    /// `window` and `completion` must stay alive, in place and untouched
    /// until the response operation is finished or cancelled.
    unsafe fn submit_response(
        &mut self,
        window: &mut [u8],
        want_headers: bool,
        completion: &Completion,
    ) -> Result<()>;

    /// Drive the stack once.
    fn poll(&mut self) -> Result<()>;

    /// Status code of the response being received, as far as known.
    fn response_status(&self) -> Option<u16>;

    /// Collect status, headers and body length of the current response
    /// read.
    ///
    /// A read that has not completed reports a body length of 0.
    fn take_response(&mut self) -> Result<ResponseMessage>;

    /// Report the completion status of `op` and release its resources.
    fn finish(&mut self, op: Operation) -> Result<()>;

    /// Abort `op` and release its resources. No completion fires afterwards.
    fn cancel(&mut self, op: Operation);
}

/// A network interface candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nic {
    /// Position in enumeration order.
    pub index: usize,
    /// `eth<N>` or `unk<N>`.
    pub name: String,
}

impl Nic {
    pub fn new(index: usize, is_ethernet: bool) -> Self {
        Self {
            index,
            name: Self::name_for(index, is_ethernet),
        }
    }

    /// Interface name for enumeration index `index`.
    pub fn name_for(index: usize, is_ethernet: bool) -> String {
        if is_ethernet {
            format!("eth{}", index)
        } else {
            format!("unk{}", index)
        }
    }
}

/// Source of interfaces and sessions.
pub trait InterfaceProvider {
    type Session: Transport;

    /// Interfaces in enumeration order. Interfaces whose name cannot be
    /// determined are left out.
    fn interfaces(&mut self) -> Result<Vec<Nic>>;

    /// Make sure the interface has (or is acquiring) an address.
    fn prepare_interface(&mut self, nic: &Nic) -> Result<()>;

    /// Open a fresh session on `nic`.
    fn open_session(&mut self, nic: &Nic) -> Result<Self::Session>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nic_names() {
        assert_eq!(Nic::new(0, true).name, "eth0");
        assert_eq!(Nic::new(3, false).name, "unk3");
    }

    #[test]
    fn test_response_message_headers() {
        let mut message = ResponseMessage::default();
        assert!(!message.has_headers());
        message
            .headers
            .push(String::from("Location"), String::from("/x"))
            .unwrap();
        assert!(message.has_headers());
    }
}
