//! Copying body fragments into the destination and reporting progress.
//!
//! Progress is rendered as a fixed-width slider followed by the number of
//! kilobytes received:
//!
//! ```text
//! [=======================>                ]     512 Kb
//! ```
//!
//! When the entity length is unknown only the kilobyte counter is reported.

use core::fmt::{self, Write};

use tracing::info;

use crate::types::ProgressCallback;

/// Empty slider frame; its inner width is the number of slider steps.
pub const SLIDER_FRAME: &str = "[                                        ]";

/// Number of positions the slider can take.
pub const SLIDER_STEPS: usize = SLIDER_FRAME.len() - 2;

/// Frame plus `" <kb> Kb"` with room for any `usize`.
const LINE_CAPACITY: usize = SLIDER_FRAME.len() + 32;

/// One rendered progress line, kept on the stack.
#[derive(Clone, Copy)]
pub struct ProgressLine {
    buf: [u8; LINE_CAPACITY],
    len: usize,
}

impl ProgressLine {
    fn empty() -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            len: 0,
        }
    }

    /// Slider at `step` (clamped to `SLIDER_STEPS`) followed by `kb`.
    pub fn slider(step: usize, kb: usize) -> Self {
        let step = step.min(SLIDER_STEPS);
        let mut line = Self::empty();
        let frame = SLIDER_FRAME.as_bytes();
        line.buf[..frame.len()].copy_from_slice(frame);
        line.len = frame.len();

        for cell in &mut line.buf[1..step.max(1)] {
            *cell = b'=';
        }
        if step > 0 {
            line.buf[step] = b'>';
        }

        // Capacity always covers the widest usize.
        let _ = write!(line, " {:7} Kb", kb);
        line
    }

    /// Kilobyte counter only.
    pub fn counter(kb: usize) -> Self {
        let mut line = Self::empty();
        let _ = write!(line, "{:7} Kb", kb);
        line
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl Write for ProgressLine {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > LINE_CAPACITY {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

impl fmt::Debug for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProgressLine").field(&self.as_str()).finish()
    }
}

/// Slider position for `downloaded` out of `content_length` bytes.
pub fn slider_step(downloaded: usize, content_length: usize) -> usize {
    if content_length == 0 {
        return 0;
    }
    (downloaded.saturating_mul(SLIDER_STEPS) / content_length).min(SLIDER_STEPS)
}

/// Destination writer and progress reporter for one download.
///
/// The destination is borrowed from the caller and never reallocated;
/// `downloaded` never exceeds its length.
pub struct Progress<'d, 'c> {
    destination: &'d mut [u8],
    downloaded: usize,
    /// Entity length, 0 when unknown.
    content_length: usize,
    last_step: usize,
    last_kb: usize,
    callback: Option<ProgressCallback<'c>>,
}

impl<'d, 'c> Progress<'d, 'c> {
    pub fn new(destination: &'d mut [u8], callback: Option<ProgressCallback<'c>>) -> Self {
        Self {
            destination,
            downloaded: 0,
            content_length: 0,
            last_step: 0,
            last_kb: 0,
            callback,
        }
    }

    /// Destination capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.destination.len()
    }

    /// Bytes copied into the destination so far.
    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// Set the entity length used for the slider (0 = unknown).
    pub fn set_content_length(&mut self, content_length: usize) {
        self.content_length = content_length;
    }

    /// Start over for a new attempt.
    pub fn reset(&mut self) {
        self.downloaded = 0;
        self.content_length = 0;
        self.last_step = 0;
        self.last_kb = 0;
    }

    /// Copy as much of `fragment` as still fits and report progress.
    ///
    /// Bytes beyond the destination capacity are dropped.
    pub fn save_portion(&mut self, fragment: &[u8]) {
        let room = self.destination.len() - self.downloaded;
        let take = fragment.len().min(room);
        self.destination[self.downloaded..self.downloaded + take]
            .copy_from_slice(&fragment[..take]);
        self.downloaded += take;

        let kb = self.downloaded >> 10;
        if self.content_length == 0 {
            if kb > self.last_kb {
                self.last_kb = kb;
                self.emit(&ProgressLine::counter(kb));
            }
            return;
        }

        let step = slider_step(self.downloaded, self.content_length);
        if step > self.last_step {
            self.last_step = step;
            self.last_kb = kb;
            self.emit(&ProgressLine::slider(step, kb));
        }
    }

    fn emit(&mut self, line: &ProgressLine) {
        match self.callback.as_mut() {
            Some(callback) => callback(line.as_str()),
            None => info!("{}", line.as_str()),
        }
    }
}

impl fmt::Debug for Progress<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("capacity", &self.destination.len())
            .field("downloaded", &self.downloaded)
            .field("content_length", &self.content_length)
            .field("last_step", &self.last_step)
            .finish()
    }
}
