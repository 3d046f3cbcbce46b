//! Chunked transfer encoding decoder.
//!
//! Decodes HTTP chunked transfer encoding as defined in RFC 7230,
//! handing each run of payload bytes to a sink as soon as it arrives.
//!
//! # Format
//!
//! ```text
//! chunk-size (hex)[;ext]\r\n
//! chunk-data\r\n
//! ...
//! 0\r\n
//! [trailer-field\r\n]*
//! \r\n
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use morpheus_httpdl::transfer::ChunkedDecoder;
//!
//! let mut decoder = ChunkedDecoder::new();
//! decoder.feed(b"5\r\nHello\r\n0\r\n\r\n", |part| sink(part))?;
//! assert!(decoder.is_done());
//! ```

use alloc::vec::Vec;

use crate::error::{NetworkError, Result};
use crate::utils::string::parse_hex;

/// Longest chunk-size digits accepted (before any extension).
const MAX_SIZE_LINE: usize = 32;

/// State of the chunked decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Waiting for chunk size line.
    ReadingSize,
    /// Reading chunk data.
    ReadingData,
    /// Expecting \r after chunk data.
    ExpectingCR,
    /// Expecting \n after chunk data.
    ExpectingLF,
    /// Skipping trailer fields after the last chunk.
    ReadingTrailer,
    /// Finished reading all chunks.
    Done,
}

/// Incremental chunked decoder.
///
/// Holds no payload itself; data is streamed to the sink passed to `feed`.
#[derive(Debug)]
pub struct ChunkedDecoder {
    state: DecoderState,
    /// Chunk-size digits of the current size line.
    size_line: [u8; MAX_SIZE_LINE],
    size_len: usize,
    /// A `;` extension started on the current size line.
    in_extension: bool,
    /// Length of the current trailer line.
    trailer_len: usize,
    /// Previous byte was a CR inside a line.
    saw_cr: bool,
    current_chunk_size: usize,
    chunk_bytes_read: usize,
    /// Payload bytes delivered so far.
    decoded: usize,
}

impl ChunkedDecoder {
    /// Create a new chunked decoder.
    pub fn new() -> Self {
        Self {
            state: DecoderState::ReadingSize,
            size_line: [0; MAX_SIZE_LINE],
            size_len: 0,
            in_extension: false,
            trailer_len: 0,
            saw_cr: false,
            current_chunk_size: 0,
            chunk_bytes_read: 0,
            decoded: 0,
        }
    }

    /// Get current decoder state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Check if decoding is complete.
    pub fn is_done(&self) -> bool {
        self.state == DecoderState::Done
    }

    /// Total payload bytes delivered.
    pub fn decoded_len(&self) -> usize {
        self.decoded
    }

    /// Decode a complete chunked body in one go.
    pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = ChunkedDecoder::new();
        let mut out = Vec::new();
        decoder.feed(data, |part| out.extend_from_slice(part))?;

        if !decoder.is_done() {
            return Err(NetworkError::InvalidResponse);
        }

        Ok(out)
    }

    /// Feed wire bytes, passing decoded payload runs to `on_data`.
    ///
    /// Returns the number of bytes consumed; bytes after the terminating
    /// empty line are left unconsumed.
    pub fn feed<F>(&mut self, data: &[u8], mut on_data: F) -> Result<usize>
    where
        F: FnMut(&[u8]),
    {
        let mut consumed = 0;

        while consumed < data.len() && self.state != DecoderState::Done {
            match self.state {
                DecoderState::ReadingData => {
                    let remaining = self.current_chunk_size - self.chunk_bytes_read;
                    let take = remaining.min(data.len() - consumed);
                    on_data(&data[consumed..consumed + take]);
                    consumed += take;
                    self.chunk_bytes_read += take;
                    self.decoded += take;

                    if self.chunk_bytes_read == self.current_chunk_size {
                        self.state = DecoderState::ExpectingCR;
                    }
                }
                DecoderState::ReadingSize => {
                    let byte = data[consumed];
                    consumed += 1;
                    if self.line_byte(byte)? {
                        self.parse_chunk_size()?;
                    } else if byte != b'\r' {
                        self.push_size_byte(byte)?;
                    }
                }
                DecoderState::ExpectingCR => {
                    let byte = data[consumed];
                    consumed += 1;
                    if byte != b'\r' {
                        return Err(NetworkError::InvalidResponse);
                    }
                    self.state = DecoderState::ExpectingLF;
                }
                DecoderState::ExpectingLF => {
                    let byte = data[consumed];
                    consumed += 1;
                    if byte != b'\n' {
                        return Err(NetworkError::InvalidResponse);
                    }
                    self.state = DecoderState::ReadingSize;
                }
                DecoderState::ReadingTrailer => {
                    let byte = data[consumed];
                    consumed += 1;
                    if self.line_byte(byte)? {
                        if self.trailer_len == 0 {
                            self.state = DecoderState::Done;
                        }
                        self.trailer_len = 0;
                    } else if byte != b'\r' {
                        self.trailer_len += 1;
                    }
                }
                DecoderState::Done => break,
            }
        }

        Ok(consumed)
    }

    /// Track CR/LF inside a line. Returns true at the end of a line.
    fn line_byte(&mut self, byte: u8) -> Result<bool> {
        match byte {
            b'\r' => {
                self.saw_cr = true;
                Ok(false)
            }
            b'\n' if self.saw_cr => {
                self.saw_cr = false;
                Ok(true)
            }
            _ if self.saw_cr => Err(NetworkError::InvalidResponse),
            b'\n' => Err(NetworkError::InvalidResponse),
            _ => Ok(false),
        }
    }

    fn push_size_byte(&mut self, byte: u8) -> Result<()> {
        if byte == b';' {
            self.in_extension = true;
        }
        if self.in_extension {
            return Ok(());
        }
        if self.size_len == MAX_SIZE_LINE {
            return Err(NetworkError::InvalidResponse);
        }
        self.size_line[self.size_len] = byte;
        self.size_len += 1;
        Ok(())
    }

    /// Parse the chunk size from the collected size line.
    fn parse_chunk_size(&mut self) -> Result<()> {
        let size_str = core::str::from_utf8(&self.size_line[..self.size_len])
            .map_err(|_| NetworkError::InvalidResponse)?;

        self.current_chunk_size = parse_hex(size_str).ok_or(NetworkError::InvalidResponse)?;
        self.size_len = 0;
        self.in_extension = false;
        self.chunk_bytes_read = 0;

        self.state = if self.current_chunk_size == 0 {
            DecoderState::ReadingTrailer
        } else {
            DecoderState::ReadingData
        };

        Ok(())
    }

    /// Reset the decoder to initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}
