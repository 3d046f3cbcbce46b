//! Status code classification and error descriptors.

/// Descriptor reported for error codes outside the known table.
pub const UNCLASSIFIED: &str = "Unclassified error";

/// Whether `code` asks the client to repeat the request elsewhere.
///
/// 306 is unused by HTTP/1.1 and treated like the rest of the 3xx range.
pub const fn is_redirection(code: u16) -> bool {
    matches!(code, 300..=307 | 308)
}

/// Whether `code` is reported as an HTTP error.
pub const fn is_error(code: u16) -> bool {
    code >= 400 && code != 308
}

/// Whether a response with `code` never carries a body.
pub const fn forbids_body(code: u16) -> bool {
    matches!(code, 100..=199 | 204 | 304)
}

/// Human readable descriptor for an error status.
pub fn describe(code: u16) -> &'static str {
    match code {
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        402 => "402 Payment required",
        403 => "403 Forbidden",
        404 => "404 Not Found",
        405 => "405 Method not allowed",
        406 => "406 Not acceptable",
        407 => "407 Proxy authentication required",
        408 => "408 Request time out",
        409 => "409 Conflict",
        410 => "410 Gone",
        411 => "411 Length required",
        412 => "412 Precondition failed",
        413 => "413 Request entity too large",
        414 => "414 Request URI too large",
        415 => "415 Unsupported media type",
        416 => "416 Requested range not satisfied",
        417 => "417 Expectation failed",
        500 => "500 Internal server error",
        501 => "501 Not implemented",
        502 => "502 Bad gateway",
        503 => "503 Service unavailable",
        504 => "504 Gateway timeout",
        505 => "505 HTTP version not supported",
        _ => UNCLASSIFIED,
    }
}
