//! Streaming HTTP/1.x codecs built on `tokio_util::codec`.
//!
//! # Components
//!
//! - [`RequestDecoder`] / [`ResponseDecoder`]: turn buffered bytes into
//!   [`Message`](crate::protocol::Message) events, one head followed by body
//!   items, for any split of the input
//! - [`ResponseEncoder`] / [`RequestEncoder`]: the reverse
//!
//! Heads are handled by the [`header`] codecs, bodies by the [`body`]
//! codecs (`Content-Length` and chunked framing).
//!
//! ```
//! use bytes::BytesMut;
//! use strand_http::codec::RequestDecoder;
//! use strand_http::protocol::Message;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET /index.html HTTP/1.1\r\nHost: zewo.co\r\n\r\n");
//! let message = decoder.decode(&mut buffer).unwrap();
//! assert!(matches!(message, Some(Message::Header(_))));
//! ```

pub mod body;
pub mod header;
mod message_decoder;
mod message_encoder;

pub use message_decoder::{MessageDecoder, RequestDecoder, ResponseDecoder};
pub use message_encoder::{MessageEncoder, RequestEncoder, ResponseEncoder};
