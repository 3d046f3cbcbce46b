//! UEFI implementation of the transport seam.
//!
//! Provides:
//! - `bindings` - UEFI protocol type definitions
//! - `ProtocolManager` - HTTP child lifecycle management
//! - `UefiSession` - `Transport` over the EFI HTTP protocol
//! - `UefiPlatform` - interface enumeration, DHCP and session opening
//! - `EventTimers` - wait budget timers on firmware timer events

pub mod bindings;
pub mod manager;
pub mod nic;
pub mod session;
pub mod timer;

pub use bindings::{
    status, BootServices, Event, Guid, Handle, HttpProtocol, HttpStatusCode, HttpVersion,
    ServiceBindingProtocol, Status, HTTP_PROTOCOL_GUID, HTTP_SERVICE_BINDING_GUID,
};
pub use manager::{ManagerState, ProtocolManager, ServiceChild};
pub use nic::UefiPlatform;
pub use session::UefiSession;
pub use timer::{EventTimer, EventTimers};
