//! Message head codecs.
//!
//! # Components
//!
//! - [`HeaderDecoder`]: request line and header fields
//! - [`ResponseHeadDecoder`]: status line, header fields and `Set-Cookie`s
//! - [`HeaderEncoder`] / [`RequestHeadEncoder`]: the reverse, adding the
//!   framing header that matches the body

mod header_decoder;
mod header_encoder;
mod response_head_decoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
pub use header_encoder::RequestHeadEncoder;
pub(crate) use header_encoder::reason_phrase;
pub use response_head_decoder::ResponseHeadDecoder;
