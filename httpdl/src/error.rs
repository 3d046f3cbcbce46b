//! Download error types

use core::fmt;

pub type Result<T> = core::result::Result<T, NetworkError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Empty URL, empty host, or an unusable destination.
    InvalidArgument,
    OutOfMemory,
    /// No interface matched, or a redirect without a `Location` header.
    NotFound,
    /// Destination smaller than the server-reported entity length.
    BufferTooSmall { required: usize },
    /// Server answered with an error status; `received` body bytes were
    /// still copied into the destination.
    HttpError { code: u16, received: usize },
    /// Redirect target equals the URL just requested.
    RecursiveRedirect,
    TooManyRedirects,
    Timeout,
    /// HTTP child could not be created or opened on the interface.
    ProtocolNotAvailable,
    /// Session configuration was rejected.
    InitializationFailed,
    /// Request could not be submitted or completed with an error.
    ConnectionFailed,
    /// Response read could not be submitted or completed with an error.
    ReceiveFailed,
    /// Response framing could not be parsed.
    InvalidResponse,
}

/// Coarse error taxonomy used to decide how far a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rejected before any I/O.
    Input,
    /// Allocation failure.
    Resource,
    /// Session open/configure/send failure, tied to the chosen interface.
    Transport,
    /// Bad redirect, self-redirect, HTTP error status, probe result.
    Protocol,
    Timeout,
}

impl NetworkError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidArgument => ErrorClass::Input,
            Self::OutOfMemory => ErrorClass::Resource,
            Self::ProtocolNotAvailable
            | Self::InitializationFailed
            | Self::ConnectionFailed
            | Self::ReceiveFailed => ErrorClass::Transport,
            Self::NotFound
            | Self::BufferTooSmall { .. }
            | Self::HttpError { .. }
            | Self::RecursiveRedirect
            | Self::TooManyRedirects
            | Self::InvalidResponse => ErrorClass::Protocol,
            Self::Timeout => ErrorClass::Timeout,
        }
    }

    /// Whether another network interface may succeed where this one failed.
    pub fn is_interface_specific(&self) -> bool {
        self.class() == ErrorClass::Transport
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "Invalid argument"),
            Self::OutOfMemory => write!(f, "Out of memory"),
            Self::NotFound => write!(f, "Not found"),
            Self::BufferTooSmall { required } => {
                write!(f, "Buffer too small ({} bytes required)", required)
            }
            Self::HttpError { code, received } => {
                write!(f, "HTTP error: {} ({} body bytes received)", code, received)
            }
            Self::RecursiveRedirect => write!(f, "Redirect points back to the requested URL"),
            Self::TooManyRedirects => write!(f, "Too many redirects"),
            Self::Timeout => write!(f, "Request timed out"),
            Self::ProtocolNotAvailable => write!(f, "HTTP protocol not available"),
            Self::InitializationFailed => write!(f, "HTTP configuration failed"),
            Self::ConnectionFailed => write!(f, "Connection failed"),
            Self::ReceiveFailed => write!(f, "Receive failed"),
            Self::InvalidResponse => write!(f, "Invalid response from server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_transport_errors_are_interface_specific() {
        assert!(NetworkError::ConnectionFailed.is_interface_specific());
        assert!(NetworkError::InitializationFailed.is_interface_specific());
        assert!(NetworkError::ProtocolNotAvailable.is_interface_specific());
        assert!(NetworkError::ReceiveFailed.is_interface_specific());
    }

    #[test]
    fn test_request_errors_are_not_interface_specific() {
        assert!(!NetworkError::Timeout.is_interface_specific());
        assert!(!NetworkError::OutOfMemory.is_interface_specific());
        assert!(!NetworkError::RecursiveRedirect.is_interface_specific());
        assert!(!NetworkError::HttpError { code: 404, received: 0 }.is_interface_specific());
        assert!(!NetworkError::BufferTooSmall { required: 1 }.is_interface_specific());
    }

    #[test]
    fn test_classes() {
        assert_eq!(NetworkError::InvalidArgument.class(), ErrorClass::Input);
        assert_eq!(NetworkError::OutOfMemory.class(), ErrorClass::Resource);
        assert_eq!(NetworkError::NotFound.class(), ErrorClass::Protocol);
        assert_eq!(NetworkError::Timeout.class(), ErrorClass::Timeout);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            NetworkError::BufferTooSmall { required: 4096 }.to_string(),
            "Buffer too small (4096 bytes required)"
        );
        assert_eq!(
            NetworkError::HttpError { code: 404, received: 12 }.to_string(),
            "HTTP error: 404 (12 body bytes received)"
        );
    }
}
