//! Per-call download state.

use crate::transfer::Progress;
use crate::types::HttpMethod;
use crate::url::UrlParts;

/// Outcome of one request/response exchange, driving the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Ok,
    /// The server redirected; the target has been rewritten.
    NeedRepeat,
    /// The server answered with an error status; its body was collected.
    HttpError(u16),
}

/// Mutable record owned by one `download` call.
///
/// The target is replaced wholesale on every redirect.
#[derive(Debug)]
pub struct DownloadContext<'d, 'c> {
    pub target: UrlParts,
    pub method: HttpMethod,
    pub progress: Progress<'d, 'c>,
    pub status: RequestStatus,
    /// Entity length announced by the last response headers.
    pub entity_length: Option<usize>,
}

impl<'d, 'c> DownloadContext<'d, 'c> {
    /// Context for `target`; HEAD when the destination is empty.
    pub fn new(target: UrlParts, progress: Progress<'d, 'c>) -> Self {
        Self {
            method: HttpMethod::for_destination(progress.capacity()),
            target,
            progress,
            status: RequestStatus::Ok,
            entity_length: None,
        }
    }

    /// Start over on another interface. The target keeps any redirect
    /// rewrites.
    pub fn restart(&mut self) {
        self.progress.reset();
        self.status = RequestStatus::Ok;
        self.entity_length = None;
    }

    /// Record an HTTP error status unless one is already recorded.
    ///
    /// Returns `true` when this call recorded it.
    pub fn record_http_error(&mut self, code: u16) -> bool {
        if matches!(self.status, RequestStatus::HttpError(_)) {
            return false;
        }
        self.status = RequestStatus::HttpError(code);
        true
    }
}
