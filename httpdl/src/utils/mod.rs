//! Utility functions and helpers.
//!
//! Provides:
//! - `string` - Growable strings, trimming, firmware string conversion
//! - `buffer` - Fallibly allocated scratch buffer

pub mod buffer;
pub mod string;

pub use buffer::{effective_buffer_size, ScratchBuffer, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
pub use string::{trim_spaces, GrowableString};
