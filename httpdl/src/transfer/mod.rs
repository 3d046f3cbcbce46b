//! Body transfer handling.
//!
//! - `chunked` - Streaming chunked transfer decoding
//! - `body` - Framing selection and completion tracking
//! - `progress` - Destination copy and progress reporting

pub mod body;
pub mod chunked;
pub mod progress;

pub use body::{BodyParser, Framing};
pub use chunked::{ChunkedDecoder, DecoderState};
pub use progress::{Progress, ProgressLine, SLIDER_FRAME, SLIDER_STEPS};
