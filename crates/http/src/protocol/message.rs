//! Decoder events and body framing.
//!
//! The codecs exchange [`Message`]s: one head, then the body as
//! [`PayloadItem`]s. [`PayloadSize`] is the framing a head announces; it is
//! read from incoming header fields and written into outgoing ones.

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue};

use crate::protocol::ParseError;

/// One head, any number of `Payload(Chunk)` items, exactly one `Payload(Eof)`.
#[derive(Debug)]
pub enum Message<T> {
    Header(T),
    Payload(PayloadItem),
}

impl<T> Message<T> {
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    pub fn into_payload_item(self) -> Option<PayloadItem> {
        match self {
            Message::Header(_) => None,
            Message::Payload(item) => Some(item),
        }
    }
}

impl<T> From<Bytes> for Message<T> {
    fn from(bytes: Bytes) -> Self {
        Self::Payload(PayloadItem::Chunk(bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    Chunk(Bytes),
    Eof,
}

impl PayloadItem {
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// `Content-Length` framing
    Length(u64),
    /// `Transfer-Encoding: chunked` framing
    Chunked,
    Empty,
}

impl PayloadSize {
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    /// The framing declared by received header fields.
    ///
    /// A transfer coding that does not end in `chunked` means no body;
    /// declaring both a length and a transfer coding is an error.
    ///
    /// refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ParseError> {
        match (headers.get(TRANSFER_ENCODING), headers.get(CONTENT_LENGTH)) {
            (None, None) => Ok(PayloadSize::Empty),
            (Some(coding), None) if ends_with_chunked(coding) => Ok(PayloadSize::Chunked),
            (Some(_), None) => Ok(PayloadSize::Empty),
            (None, Some(length)) => {
                let length = length
                    .to_str()
                    .map_err(|_e| ParseError::invalid_content_length("value is not visible ascii"))?
                    .trim();
                length
                    .parse::<u64>()
                    .map(PayloadSize::Length)
                    .map_err(|_e| ParseError::invalid_content_length(format!("value {length} is not u64")))
            }
            (Some(_), Some(_)) => {
                Err(ParseError::invalid_content_length("transfer-encoding and content-length both present"))
            }
        }
    }

    /// Replaces the framing fields in `headers` with this framing.
    pub fn write_headers(self, headers: &mut HeaderMap) {
        match self {
            PayloadSize::Length(n) => {
                headers.remove(TRANSFER_ENCODING);
                headers.insert(CONTENT_LENGTH, HeaderValue::from(n));
            }
            PayloadSize::Chunked => {
                headers.remove(CONTENT_LENGTH);
                headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            }
            PayloadSize::Empty => {
                headers.remove(CONTENT_LENGTH);
                headers.remove(TRANSFER_ENCODING);
            }
        }
    }
}

/// Chunked must be the final transfer coding.
fn ends_with_chunked(value: &HeaderValue) -> bool {
    value.as_bytes().rsplit(|b| *b == b',').next().is_some_and(|last| last.trim_ascii().eq_ignore_ascii_case(b"chunked"))
}
