//! Message body framing.
//!
//! # Components
//!
//! - [`PayloadDecoder`]: reads a body framed by `Content-Length`
//!   or `Transfer-Encoding: chunked`, or an absent body
//! - [`PayloadEncoder`]: writes a body in one of the same framings

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
