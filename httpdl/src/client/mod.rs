//! Download client.
//!
//! The state machine runs against the `Transport` and `InterfaceProvider`
//! seams; the firmware implementations live in `protocol::uefi`.
//!
//! # Example
//!
//! ```ignore
//! use morpheus_httpdl::client::Downloader;
//! use morpheus_httpdl::protocol::uefi::{EventTimers, UefiPlatform};
//!
//! let platform = unsafe { UefiPlatform::new(boot_services, image_handle)? };
//! let timers = unsafe { EventTimers::new(boot_services)? };
//! let mut downloader = Downloader::new(platform, timers);
//!
//! let mut buffer = vec![0u8; 64 * 1024];
//! let written = downloader.download("http://192.168.10.23:5000/update", &mut buffer, None)?;
//! ```

pub mod context;
pub mod downloader;
pub mod exchange;
pub mod redirect;
pub mod transport;
pub mod wait;

pub use context::{DownloadContext, RequestStatus};
pub use downloader::{DownloadConfig, Downloader, DEFAULT_MAX_REDIRECTS};
pub use transport::{InterfaceProvider, Nic, Operation, ResponseMessage, SessionConfig, Transport};
pub use wait::{Completion, InFlight, WaitOutcome};
