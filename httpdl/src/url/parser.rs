//! URL composition for download targets.
//!
//! Splits a free-form location into the `scheme://authority` part and the
//! path part, filling in defaults.
//!
//! # Examples
//!
//! ```ignore
//! use morpheus_httpdl::url::UrlParts;
//!
//! let parts = UrlParts::compose("192.168.10.23:5000/update")?;
//! assert_eq!(parts.server_and_scheme(), "http://192.168.10.23:5000");
//! assert_eq!(parts.uri(), "/update");
//! ```

use crate::error::{NetworkError, Result};
use crate::utils::string::{trim_spaces, GrowableString};

/// Scheme assumed when the input carries none.
pub const DEFAULT_SCHEME_PREFIX: &str = "http://";

/// Scheme separator.
pub const SCHEME_SEPARATOR: &str = "://";

/// A download target split into server and path.
///
/// `server_and_scheme` looks like `http://host[:port]`; `uri` is the path
/// (plus query) and always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    server_and_scheme: GrowableString,
    uri: GrowableString,
}

impl UrlParts {
    /// Compose target parts from user input.
    ///
    /// - Spaces and tabs around the input and around the derived path are
    ///   trimmed.
    /// - Without `://`, `http://` is prepended.
    /// - The path starts at the first `/` after the authority; `/` when
    ///   there is none.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for empty input, `OutOfMemory` if the parts cannot
    /// be allocated.
    pub fn compose(input: &str) -> Result<Self> {
        let input = trim_spaces(input);
        if input.is_empty() {
            return Err(NetworkError::InvalidArgument);
        }

        let mut server_and_scheme = GrowableString::new();
        let after_scheme = match input.find(SCHEME_SEPARATOR) {
            Some(idx) => {
                let authority_start = idx + SCHEME_SEPARATOR.len();
                server_and_scheme.append(&input[..authority_start], 0)?;
                &input[authority_start..]
            }
            None => {
                server_and_scheme.append(DEFAULT_SCHEME_PREFIX, 0)?;
                input
            }
        };

        let (authority, path) = split_authority(after_scheme);
        server_and_scheme.append(authority, 0)?;

        Ok(Self {
            server_and_scheme,
            uri: normalize_path(path)?,
        })
    }

    /// Build parts from already separated components.
    pub fn from_parts(server_and_scheme: GrowableString, uri: GrowableString) -> Self {
        Self { server_and_scheme, uri }
    }

    pub fn server_and_scheme(&self) -> &str {
        self.server_and_scheme.as_str()
    }

    pub fn uri(&self) -> &str {
        self.uri.as_str()
    }

    /// Authority after `://`, used as the `Host` header value.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the authority is empty.
    pub fn host(&self) -> Result<&str> {
        let server = self.server_and_scheme.as_str();
        let host = match server.find(SCHEME_SEPARATOR) {
            Some(idx) => &server[idx + SCHEME_SEPARATOR.len()..],
            None => server,
        };
        if host.is_empty() {
            return Err(NetworkError::InvalidArgument);
        }
        Ok(host)
    }

    /// Absolute URL: server followed by the path.
    pub fn full_url(&self) -> Result<GrowableString> {
        let mut url = GrowableString::new();
        url.append(self.server_and_scheme.as_str(), 0)?;
        if !self.uri.as_str().starts_with('/') {
            url.append("/", 0)?;
        }
        url.append(self.uri.as_str(), 0)?;
        Ok(url)
    }
}

/// Split `authority[/path]` at the first `/`.
///
/// The returned path keeps its leading `/`, or is empty when absent.
pub fn split_authority(s: &str) -> (&str, &str) {
    match s.find('/') {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    }
}

/// Trim a path and make it absolute (`/` when empty).
pub fn normalize_path(path: &str) -> Result<GrowableString> {
    let path = trim_spaces(path);
    let mut uri = GrowableString::new();
    if !path.starts_with('/') {
        uri.append("/", 0)?;
    }
    uri.append(path, 0)?;
    Ok(uri)
}
