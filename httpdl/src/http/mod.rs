//! HTTP message handling
//!
//! - Request building (fixed header set)
//! - Response header lookup
//! - Status classification and descriptors

pub mod headers;
pub mod request;
pub mod status;

pub use headers::{Header, HeaderRole, Headers, RequestHeaders};
pub use request::{Request, DEFAULT_USER_AGENT};
