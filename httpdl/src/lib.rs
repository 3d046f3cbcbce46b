//! MorpheusX HTTP Downloader
//!
//! Polling-driven HTTP/1.1 download client for the UEFI boot environment.
//! Fetches a resource into a caller-supplied buffer, following redirects,
//! decoding chunked and length-delimited bodies and reporting progress.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod client;
pub mod error;
pub mod http;
pub mod protocol;
pub mod time;
pub mod transfer;
pub mod types;
pub mod url;
pub mod utils;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::{DownloadConfig, Downloader, InterfaceProvider, Transport};
pub use error::{ErrorClass, NetworkError, Result};
pub use types::{HttpMethod, ProgressCallback};
