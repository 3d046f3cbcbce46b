//! Scratch buffer used as the transport read window.

use alloc::vec::Vec;

use crate::error::{NetworkError, Result};

/// Default read window size (32 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Largest read window accepted (4 MiB).
pub const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Zero-initialized, fallibly allocated byte buffer.
///
/// Owned by one download attempt and released when the attempt ends.
#[derive(Debug)]
pub struct ScratchBuffer {
    data: Vec<u8>,
}

impl ScratchBuffer {
    /// Allocate `size` zeroed bytes, reporting `OutOfMemory` instead of
    /// aborting.
    pub fn allocate(size: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| NetworkError::OutOfMemory)?;
        data.resize(size, 0);
        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// First `len` bytes (clamped to the buffer size).
    pub fn window(&self, len: usize) -> &[u8] {
        &self.data[..len.min(self.data.len())]
    }

    /// Mutable first `len` bytes (clamped to the buffer size).
    pub fn window_mut(&mut self, len: usize) -> &mut [u8] {
        let len = len.min(self.data.len());
        &mut self.data[..len]
    }
}

/// Clamp a requested buffer size into the accepted range.
///
/// Zero and oversized requests fall back to the default.
pub fn effective_buffer_size(requested: usize) -> usize {
    if requested == 0 || requested > MAX_BUFFER_SIZE {
        DEFAULT_BUFFER_SIZE
    } else {
        requested
    }
}
