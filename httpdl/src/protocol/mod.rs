//! Platform implementations of the transport seam.

pub mod uefi;
