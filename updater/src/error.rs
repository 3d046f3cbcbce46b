//! Update error types

use core::fmt;

use morpheus_httpdl::NetworkError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// The download failed.
    Network(NetworkError),
    /// The update endpoint answered with something that is not a notice.
    MalformedNotice,
    OutOfMemory,
}

impl From<NetworkError> for UpdateError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::OutOfMemory => Self::OutOfMemory,
            other => Self::Network(other),
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Update download failed: {}", e),
            Self::MalformedNotice => write!(f, "Malformed update notice"),
            Self::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}
