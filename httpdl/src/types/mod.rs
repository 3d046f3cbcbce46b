//! Shared type definitions.

/// HTTP method used by the downloader.
///
/// `Head` is selected when the caller passes an empty destination and only
/// wants to learn the entity length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
}

impl HttpMethod {
    /// Get the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Method implied by a destination of `capacity` bytes.
    pub fn for_destination(capacity: usize) -> Self {
        if capacity == 0 {
            HttpMethod::Head
        } else {
            HttpMethod::Get
        }
    }
}

/// Progress callback type for download operations.
///
/// Receives a short human-readable status line. Calls arrive in increasing
/// progress order; the callback must not block.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(&str);
