//! HTTP request construction.
//!
//! Every request carries exactly three headers: `Host`, `Connection: close`
//! and `User-Agent`. No connection is reused between requests.
//!
//! # Examples
//!
//! ```ignore
//! use morpheus_httpdl::http::Request;
//! use morpheus_httpdl::url::UrlParts;
//!
//! let target = UrlParts::compose("http://example.com/file.bin")?;
//! let request = Request::build(HttpMethod::Get, &target, DEFAULT_USER_AGENT)?;
//! assert_eq!(request.url(), "http://example.com/file.bin");
//! ```

use alloc::format;
use alloc::string::String;

use super::headers::{HeaderRole, RequestHeaders};
use crate::error::{NetworkError, Result};
use crate::types::HttpMethod;
use crate::url::UrlParts;
use crate::utils::string::GrowableString;

/// `User-Agent` sent when the configuration does not override it.
pub const DEFAULT_USER_AGENT: &str = "MorpheusX/1.0 (UEFI; httpdl)";

/// Value of the `Connection` header.
pub const CONNECTION_CLOSE: &str = "close";

/// A request ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: HttpMethod,
    url: GrowableString,
    headers: RequestHeaders,
}

impl Request {
    /// Build a request for `target`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the target has no host or `user_agent` is
    /// empty; `OutOfMemory` on allocation failure.
    pub fn build(method: HttpMethod, target: &UrlParts, user_agent: &str) -> Result<Self> {
        let host = target.host()?;
        if user_agent.is_empty() {
            return Err(NetworkError::InvalidArgument);
        }

        let mut headers = RequestHeaders::new();
        headers.set(HeaderRole::Host, host)?;
        headers.set(HeaderRole::Connection, CONNECTION_CLOSE)?;
        headers.set(HeaderRole::UserAgent, user_agent)?;

        Ok(Self {
            method,
            url: target.full_url()?,
            headers,
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Absolute request URL.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    /// `METHOD url HTTP/1.1`, for logging.
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method.as_str(), self.url)
    }
}
