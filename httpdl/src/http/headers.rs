//! HTTP header collections.
//!
//! `Headers` holds what the server sent, in arrival order, with
//! case-insensitive lookup. `RequestHeaders` holds the fixed set this client
//! sends, keyed by role.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{NetworkError, Result};
use crate::utils::string::{has_token, parse_decimal, trim_spaces};

/// A single header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Response header fields in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a field, keeping earlier fields with the same name.
    pub fn push(&mut self, name: String, value: String) -> Result<()> {
        self.entries
            .try_reserve(1)
            .map_err(|_| NetworkError::OutOfMemory)?;
        self.entries.push(Header { name, value });
        Ok(())
    }

    /// First value of `name`, compared case-insensitively.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// `Location` header, trimmed. `None` when absent or blank.
    pub fn location(&self) -> Option<&str> {
        self.find("Location")
            .map(trim_spaces)
            .filter(|l| !l.is_empty())
    }

    /// Parsed `Content-Length`, if present and well-formed.
    pub fn content_length(&self) -> Option<usize> {
        self.find("Content-Length").and_then(parse_decimal)
    }

    /// Whether `Transfer-Encoding` lists `chunked`.
    pub fn is_chunked(&self) -> bool {
        self.find("Transfer-Encoding")
            .map(|v| has_token(v, "chunked"))
            .unwrap_or(false)
    }
}

/// Role of a header this client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeaderRole {
    Host,
    Connection,
    UserAgent,
}

impl HeaderRole {
    /// Wire name of the header.
    pub const fn name(self) -> &'static str {
        match self {
            HeaderRole::Host => "Host",
            HeaderRole::Connection => "Connection",
            HeaderRole::UserAgent => "User-Agent",
        }
    }
}

/// Request headers keyed by role, kept in role order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(HeaderRole, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Set the value for `role`, replacing an earlier one.
    pub fn set(&mut self, role: HeaderRole, value: &str) -> Result<()> {
        let mut owned = String::new();
        owned
            .try_reserve_exact(value.len())
            .map_err(|_| NetworkError::OutOfMemory)?;
        owned.push_str(value);

        match self.entries.binary_search_by_key(&role, |(r, _)| *r) {
            Ok(idx) => self.entries[idx].1 = owned,
            Err(idx) => {
                self.entries
                    .try_reserve(1)
                    .map_err(|_| NetworkError::OutOfMemory)?;
                self.entries.insert(idx, (role, owned));
            }
        }
        Ok(())
    }

    pub fn get(&self, role: HeaderRole) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, value)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(r, v)| (r.name(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        let mut h = Headers::new();
        for (n, v) in pairs {
            h.push(n.to_string(), v.to_string()).unwrap();
        }
        h
    }

    // ==================== Response Headers ====================

    #[test]
    fn test_find_case_insensitive() {
        let h = headers(&[("content-length", "10")]);
        assert_eq!(h.find("Content-Length"), Some("10"));
        assert_eq!(h.find("CONTENT-LENGTH"), Some("10"));
        assert_eq!(h.find("Location"), None);
    }

    #[test]
    fn test_find_returns_first() {
        let h = headers(&[("X-A", "1"), ("x-a", "2")]);
        assert_eq!(h.find("X-A"), Some("1"));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_location() {
        assert_eq!(headers(&[("Location", " /p2 ")]).location(), Some("/p2"));
        assert_eq!(headers(&[("Location", "  ")]).location(), None);
        assert_eq!(headers(&[]).location(), None);
    }

    #[test]
    fn test_content_length() {
        assert_eq!(headers(&[("Content-Length", "1000")]).content_length(), Some(1000));
        assert_eq!(headers(&[("Content-Length", "abc")]).content_length(), None);
    }

    #[test]
    fn test_is_chunked() {
        assert!(headers(&[("Transfer-Encoding", "chunked")]).is_chunked());
        assert!(headers(&[("transfer-encoding", "gzip, CHUNKED")]).is_chunked());
        assert!(!headers(&[("Transfer-Encoding", "identity")]).is_chunked());
        assert!(!headers(&[]).is_chunked());
    }

    // ==================== Request Headers ====================

    #[test]
    fn test_request_headers_role_order() {
        let mut h = RequestHeaders::new();
        h.set(HeaderRole::UserAgent, "agent").unwrap();
        h.set(HeaderRole::Host, "h").unwrap();
        h.set(HeaderRole::Connection, "close").unwrap();

        let names: Vec<&str> = h.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Host", "Connection", "User-Agent"]);
    }

    #[test]
    fn test_request_headers_replace() {
        let mut h = RequestHeaders::new();
        h.set(HeaderRole::Host, "a").unwrap();
        h.set(HeaderRole::Host, "b").unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h.get(HeaderRole::Host), Some("b"));
    }
}
