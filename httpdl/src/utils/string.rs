//! String utilities for the download path.
//!
//! Provides no_std compatible string operations:
//! - `GrowableString`, the fallible append-and-grow buffer every URL and
//!   redirect rewrite goes through
//! - ASCII to UTF-16 / C string conversion for firmware calls
//! - Trimming and number parsing for header values
//!
//! # Examples
//!
//! ```ignore
//! use morpheus_httpdl::utils::string::GrowableString;
//!
//! let mut url = GrowableString::new();
//! url.append("http://", 0)?;
//! url.append("host/path", 4)?;
//! assert_eq!(url.as_str(), "http://host");
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{NetworkError, Result};

/// Owned string that only grows through fallible allocation.
///
/// Growth is geometric: when an append does not fit, capacity is raised in
/// steps of twice the appended length until it covers the needed size. A
/// failed reservation leaves the existing content untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrowableString {
    inner: String,
}

impl GrowableString {
    /// Create an empty string without allocating.
    pub const fn new() -> Self {
        Self { inner: String::new() }
    }

    /// Create a string holding a copy of `source`.
    pub fn try_from_str(source: &str) -> Result<Self> {
        let mut s = Self::new();
        s.append(source, 0)?;
        Ok(s)
    }

    /// Append at most `max_chars` characters of `source`, or all of it when
    /// `max_chars` is zero.
    ///
    /// An empty `source` is a no-op. On `OutOfMemory` the string keeps its
    /// previous content.
    pub fn append(&mut self, source: &str, max_chars: usize) -> Result<()> {
        let portion = if max_chars == 0 {
            source
        } else {
            match source.char_indices().nth(max_chars) {
                Some((end, _)) => &source[..end],
                None => source,
            }
        };

        if portion.is_empty() {
            return Ok(());
        }

        let needed = self
            .inner
            .len()
            .checked_add(portion.len())
            .ok_or(NetworkError::OutOfMemory)?;

        if self.inner.capacity() < needed {
            let step = portion.len().saturating_mul(2);
            let mut new_capacity = self.inner.capacity();
            while new_capacity < needed {
                new_capacity = new_capacity.saturating_add(step);
            }
            self.inner
                .try_reserve_exact(new_capacity - self.inner.len())
                .map_err(|_| NetworkError::OutOfMemory)?;
        }

        self.inner.push_str(portion);
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn into_string(self) -> String {
        self.inner
    }
}

impl fmt::Display for GrowableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl PartialEq<str> for GrowableString {
    fn eq(&self, other: &str) -> bool {
        self.inner == other
    }
}

impl PartialEq<&str> for GrowableString {
    fn eq(&self, other: &&str) -> bool {
        self.inner == *other
    }
}

/// Trim leading and trailing spaces and tabs.
///
/// Only those two characters are stripped; CR/LF are left for the caller to
/// reject.
pub fn trim_spaces(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\t')
}

/// Convert an ASCII string to null-terminated UTF-16, failing on allocation.
///
/// UEFI takes URLs as CHAR16 strings. Non-ASCII bytes are passed through as
/// their byte value.
pub fn try_ascii_to_utf16(ascii: &str) -> Result<Vec<u16>> {
    let mut out: Vec<u16> = Vec::new();
    out.try_reserve_exact(ascii.len() + 1)
        .map_err(|_| NetworkError::OutOfMemory)?;
    out.extend(ascii.bytes().map(u16::from));
    out.push(0);
    Ok(out)
}

/// Copy a string into a null-terminated byte buffer (CHAR8 field).
pub fn try_to_c_string(s: &str) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::new();
    out.try_reserve_exact(s.len() + 1)
        .map_err(|_| NetworkError::OutOfMemory)?;
    out.extend_from_slice(s.as_bytes());
    out.push(0);
    Ok(out)
}

/// Copy a null-terminated byte string owned by firmware.
///
/// Invalid UTF-8 is replaced lossily; header values are expected to be ASCII.
///
/// # Safety
///
/// `ptr` must be null or point to a readable, null-terminated byte string.
pub unsafe fn c_str_to_string(ptr: *const u8) -> Result<String> {
    if ptr.is_null() {
        return Ok(String::new());
    }
    let bytes = core::ffi::CStr::from_ptr(ptr.cast()).to_bytes();
    let mut out = String::new();
    out.try_reserve_exact(bytes.len())
        .map_err(|_| NetworkError::OutOfMemory)?;
    out.push_str(&String::from_utf8_lossy(bytes));
    Ok(out)
}

/// Parse a decimal header value such as `Content-Length`.
///
/// Surrounding spaces are ignored; anything else, including a sign, fails.
pub fn parse_decimal(s: &str) -> Option<usize> {
    let digits = trim_spaces(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a chunk-size line (hexadecimal, extensions after `;` ignored).
///
/// Only hex digits are accepted; a sign fails.
pub fn parse_hex(s: &str) -> Option<usize> {
    let size = trim_spaces(s.split(';').next().unwrap_or(""));
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    usize::from_str_radix(size, 16).ok()
}

/// Check whether a comma-separated header value lists `token`
/// (case-insensitive).
pub fn has_token(value: &str, token: &str) -> bool {
    value
        .split(',')
        .any(|item| trim_spaces(item).eq_ignore_ascii_case(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ==================== GrowableString ====================

    #[test]
    fn test_append_whole_source() {
        let mut s = GrowableString::new();
        s.append("http://", 0).unwrap();
        s.append("example.com", 0).unwrap();
        assert_eq!(s.as_str(), "http://example.com");
    }

    #[test]
    fn test_append_limited_chars() {
        let mut s = GrowableString::new();
        s.append("example.com/path", 11).unwrap();
        assert_eq!(s.as_str(), "example.com");
    }

    #[test]
    fn test_append_limit_larger_than_source() {
        let mut s = GrowableString::new();
        s.append("abc", 10).unwrap();
        assert_eq!(s.as_str(), "abc");
    }

    #[test]
    fn test_append_empty_is_noop() {
        let mut s = GrowableString::try_from_str("keep").unwrap();
        let cap = s.capacity();
        s.append("", 0).unwrap();
        assert_eq!(s.as_str(), "keep");
        assert_eq!(s.capacity(), cap);
    }

    #[test]
    fn test_append_counts_chars_not_bytes() {
        let mut s = GrowableString::new();
        s.append("h\u{e9}llo", 2).unwrap();
        assert_eq!(s.as_str(), "h\u{e9}");
    }

    #[test]
    fn test_growth_covers_needed_size() {
        let mut s = GrowableString::try_from_str("abcd").unwrap();
        s.append("efghij", 0).unwrap();
        assert!(s.capacity() >= 10);
        assert_eq!(s.len(), 10);
    }

    #[test]
    fn test_compare_with_str() {
        let s = GrowableString::try_from_str("/p2").unwrap();
        assert_eq!(s, "/p2");
        assert!(s != "/p3");
    }

    proptest! {
        #[test]
        fn prop_appends_never_truncate(parts in proptest::collection::vec(".{0,40}", 0..16)) {
            let mut s = GrowableString::new();
            let mut expected = String::new();
            for part in &parts {
                s.append(part, 0).unwrap();
                expected.push_str(part);
            }
            prop_assert_eq!(s.len(), parts.iter().map(|p| p.len()).sum::<usize>());
            prop_assert_eq!(s.as_str(), expected.as_str());
        }

        #[test]
        fn prop_max_chars_truncates_exactly(source in "[a-z/.:]{0,64}", max in 1usize..80) {
            let mut s = GrowableString::new();
            s.append(&source, max).unwrap();
            prop_assert_eq!(s.len(), source.len().min(max));
            prop_assert!(source.starts_with(s.as_str()));
        }
    }

    // ==================== Conversions ====================

    #[test]
    fn test_ascii_to_utf16() {
        let wide = try_ascii_to_utf16("http://h/").unwrap();
        assert_eq!(wide.len(), 10);
        assert_eq!(wide[0], b'h' as u16);
        assert_eq!(*wide.last().unwrap(), 0);
    }

    #[test]
    fn test_to_c_string() {
        let c = try_to_c_string("close").unwrap();
        assert_eq!(c, b"close\0");
    }

    #[test]
    fn test_c_str_to_string() {
        let raw = b"Location\0";
        let s = unsafe { c_str_to_string(raw.as_ptr()) }.unwrap();
        assert_eq!(s, "Location");
        let empty = unsafe { c_str_to_string(core::ptr::null()) }.unwrap();
        assert!(empty.is_empty());
    }

    // ==================== Parsing ====================

    #[test]
    fn test_trim_spaces() {
        assert_eq!(trim_spaces(" \t/path\t "), "/path");
        assert_eq!(trim_spaces("\r\n"), "\r\n");
        assert_eq!(trim_spaces(""), "");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1024"), Some(1024));
        assert_eq!(parse_decimal(" 42 "), Some(42));
        assert_eq!(parse_decimal("-1"), None);
        assert_eq!(parse_decimal("12a"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("1f"), Some(31));
        assert_eq!(parse_hex("A"), Some(10));
        assert_eq!(parse_hex("5;name=value"), Some(5));
        assert_eq!(parse_hex("xyz"), None);
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("+a"), None);
        assert_eq!(parse_hex("-1"), None);
    }

    #[test]
    fn test_has_token() {
        assert!(has_token("chunked", "chunked"));
        assert!(has_token("gzip, Chunked", "chunked"));
        assert!(!has_token("identity", "chunked"));
    }
}
