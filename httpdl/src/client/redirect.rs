//! Redirect target resolution.
//!
//! A `Location` value replaces the stored server and path:
//!
//! - `scheme://host/path` replaces both.
//! - `//host/path` is taken as `http://host/path`.
//! - `/path` and anything else is a path on the current server.
//!
//! A target that names the URL just requested would bounce forever and is
//! rejected.

use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::url::{normalize_path, UrlParts, DEFAULT_SCHEME_PREFIX, SCHEME_SEPARATOR};
use crate::utils::string::GrowableString;

/// Prefix of a network-path reference.
const NETWORK_PATH_PREFIX: &str = "//";

/// Rewrite `target` from a `Location` header.
///
/// `requested_url` is the absolute URL of the request that produced the
/// redirect. On error `target` is left unchanged.
///
/// # Errors
///
/// `RecursiveRedirect` when `location` (as sent, or once resolved) equals
/// `requested_url`; `OutOfMemory` if the new parts cannot be allocated.
pub fn resolve_location(location: &str, target: &mut UrlParts, requested_url: &str) -> Result<()> {
    if location == requested_url {
        return Err(NetworkError::RecursiveRedirect);
    }

    let resolved = if let Some(rest) = network_path(location) {
        let mut absolute = GrowableString::new();
        absolute.append(DEFAULT_SCHEME_PREFIX, 0)?;
        absolute.append(rest, 0)?;
        UrlParts::compose(absolute.as_str())?
    } else if !is_server_path(location) && location.contains(SCHEME_SEPARATOR) {
        UrlParts::compose(location)?
    } else {
        let server = GrowableString::try_from_str(target.server_and_scheme())?;
        UrlParts::from_parts(server, normalize_path(location)?)
    };

    if resolved.full_url()?.as_str() == requested_url {
        return Err(NetworkError::RecursiveRedirect);
    }

    debug!(
        "redirect resolved to {}{}",
        resolved.server_and_scheme(),
        resolved.uri()
    );
    *target = resolved;
    Ok(())
}

/// `/path` on the current server; a `://` later on is part of the query.
fn is_server_path(location: &str) -> bool {
    location.starts_with('/') && !location.starts_with(NETWORK_PATH_PREFIX)
}

/// Remainder after `//` for a network-path reference with a host.
fn network_path(location: &str) -> Option<&str> {
    location
        .strip_prefix(NETWORK_PATH_PREFIX)
        .filter(|rest| !rest.is_empty() && !rest.starts_with('/'))
}
