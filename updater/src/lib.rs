//! MorpheusX Updater
//!
//! Asks the update server whether a new firmware image is published and
//! downloads it. Built on `morpheus-httpdl`.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod client;
pub mod error;
pub mod notice;

pub use client::{UpdateClient, NOTICE_BUFFER_SIZE};
pub use error::UpdateError;
pub use notice::UpdateNotice;
