//! Response body framing.
//!
//! Picks the framing of a response body from the request method, the status
//! code and the headers, then tracks completion while body bytes are fed in.
//!
//! | Condition                              | Framing          |
//! |----------------------------------------|------------------|
//! | HEAD, 1xx, 204, 304                    | no body          |
//! | `Transfer-Encoding: chunked`           | chunked          |
//! | `Content-Length: n`                    | length-delimited |
//! | otherwise                              | until close      |

use crate::error::Result;
use crate::http::status::forbids_body;
use crate::http::Headers;
use crate::types::HttpMethod;

use super::chunked::ChunkedDecoder;

/// How the body of one response is delimited.
#[derive(Debug)]
pub enum Framing {
    /// The response carries no body.
    None,
    /// Exactly this many bytes follow the headers.
    Length(usize),
    /// Chunked transfer coding.
    Chunked(ChunkedDecoder),
    /// Body ends when the peer stops sending.
    UntilClose,
}

/// Tracks one response body from first byte to completion.
#[derive(Debug)]
pub struct BodyParser {
    framing: Framing,
    /// Entity length announced by `Content-Length`, even when no body
    /// follows (HEAD).
    declared_length: Option<usize>,
    /// Body bytes seen on the wire.
    consumed: usize,
    complete: bool,
}

impl BodyParser {
    /// Choose the framing for a response to `method` with `status_code`.
    pub fn new(method: HttpMethod, status_code: u16, headers: &Headers) -> Self {
        let chunked = headers.is_chunked();
        let declared_length = if chunked { None } else { headers.content_length() };

        let framing = if method == HttpMethod::Head || forbids_body(status_code) {
            Framing::None
        } else if chunked {
            Framing::Chunked(ChunkedDecoder::new())
        } else if let Some(len) = declared_length {
            Framing::Length(len)
        } else {
            Framing::UntilClose
        };

        let complete = matches!(framing, Framing::None | Framing::Length(0));

        Self {
            framing,
            declared_length,
            consumed: 0,
            complete,
        }
    }

    pub fn framing(&self) -> &Framing {
        &self.framing
    }

    /// Entity length known from the headers, if any.
    pub fn entity_length(&self) -> Option<usize> {
        self.declared_length
    }

    /// Whether the whole message has been received.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Body bytes consumed so far (wire bytes for chunked bodies).
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Feed body bytes; payload fragments go to `on_data`.
    ///
    /// Bytes past a declared length or past the last chunk are ignored.
    pub fn feed<F>(&mut self, data: &[u8], mut on_data: F) -> Result<()>
    where
        F: FnMut(&[u8]),
    {
        if self.complete || data.is_empty() {
            return Ok(());
        }

        match &mut self.framing {
            Framing::None => {}
            Framing::Length(len) => {
                let take = (*len - self.consumed).min(data.len());
                on_data(&data[..take]);
                self.consumed += take;
                if self.consumed == *len {
                    self.complete = true;
                }
            }
            Framing::Chunked(decoder) => {
                self.consumed += decoder.feed(data, &mut on_data)?;
                if decoder.is_done() {
                    self.complete = true;
                }
            }
            Framing::UntilClose => {
                on_data(data);
                self.consumed += data.len();
            }
        }

        Ok(())
    }

    /// The peer signalled the end of the stream (a read returned no data).
    pub fn finish_stream(&mut self) {
        if matches!(self.framing, Framing::UntilClose) {
            self.complete = true;
        }
    }
}
