//! Request head decoding.
//!
//! `httparse` locates the request line and header fields in the buffer;
//! their byte ranges are recorded so the values can be sliced out of one
//! frozen `Bytes` without copying.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header section size: 8 KiB
//! - HTTP/1.0 and HTTP/1.1 only

use bytes::{Bytes, BytesMut};
use http::header::{COOKIE, Entry, SET_COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{AttributedCookie, ParseError, PayloadSize, RequestHead, Uri};
use crate::utils::ensure;

pub(crate) const MAX_HEADER_NUM: usize = 64;

pub(crate) const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Request methods accepted on the wire.
const KNOWN_METHODS: &[&str] = &[
    "DELETE", "GET", "HEAD", "POST", "PUT", "CONNECT", "OPTIONS", "TRACE", "PATCH",
    "COPY", "LOCK", "MKCOL", "MOVE", "PROPFIND", "PROPPATCH", "SEARCH", "UNLOCK",
    "BIND", "REBIND", "UNBIND", "ACL",
    "REPORT", "MKACTIVITY", "CHECKOUT", "MERGE", "M-SEARCH", "NOTIFY", "SUBSCRIBE", "UNSUBSCRIBE",
    "PURGE", "MKCALENDAR", "LINK", "UNLINK",
];

/// Decodes a request line and its header fields.
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let body_offset = match req.parse(src).map_err(from_httparse)? {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };
        trace!(head_size = body_offset, "parsed request head");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let method = parse_method(req.method.unwrap_or_default())?;
        let version = parse_version(req.version)?;
        let uri = Uri::parse(req.path.unwrap_or_default())?;

        let header_count = req.headers.len();
        let mut indices = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];
        HeaderIndex::record(src, req.headers, &mut indices);

        let head_bytes = src.split_to(body_offset).freeze();
        let headers = collect_headers(&head_bytes, &indices[..header_count], None)?;

        let payload_size = PayloadSize::from_headers(&headers)?;
        Ok(Some((RequestHead { method, uri, version, headers }, payload_size)))
    }
}

fn parse_method(method: &str) -> Result<Method, ParseError> {
    ensure!(KNOWN_METHODS.contains(&method), ParseError::invalid_method(method));
    Method::from_bytes(method.as_bytes()).map_err(|_e| ParseError::invalid_method(method))
}

pub(super) fn parse_version(version: Option<u8>) -> Result<Version, ParseError> {
    match version {
        Some(0) => Ok(Version::HTTP_10),
        Some(1) => Ok(Version::HTTP_11),
        v => Err(ParseError::InvalidVersion(v)),
    }
}

pub(super) fn from_httparse(e: Error) -> ParseError {
    match e {
        Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        Error::Version => ParseError::InvalidVersion(None),
        Error::Status => ParseError::invalid_status(e),
        e => ParseError::invalid_header(e),
    }
}

/// Byte ranges of one header's name and value within the head buffer.
#[derive(Clone, Copy)]
pub(super) struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

pub(super) const EMPTY_HEADER_INDEX: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

impl HeaderIndex {
    pub(super) fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let base = bytes.as_ptr() as usize;
        for (header, index) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - base;
            index.name = (name_start, name_start + header.name.len());
            let value_start = header.value.as_ptr() as usize - base;
            index.value = (value_start, value_start + header.value.len());
        }
    }
}

/// Builds the header map, folding repeated names into one value.
///
/// `Cookie` values fold with `"; "`, everything else with `", "`. When
/// `cookies` is given, `Set-Cookie` fields are parsed into it instead.
pub(super) fn collect_headers(
    bytes: &Bytes,
    indices: &[HeaderIndex],
    mut cookies: Option<&mut Vec<AttributedCookie>>,
) -> Result<HeaderMap, ParseError> {
    let mut headers = HeaderMap::<HeaderValue>::with_capacity(indices.len());

    for index in indices {
        let name = HeaderName::from_bytes(&bytes[index.name.0..index.name.1]).map_err(ParseError::invalid_header)?;
        let value = bytes.slice(index.value.0..index.value.1);

        if name == SET_COOKIE {
            if let Some(cookies) = cookies.as_deref_mut() {
                let cookie = std::str::from_utf8(&value).ok().and_then(AttributedCookie::parse);
                match cookie {
                    Some(cookie) => cookies.push(cookie),
                    None => trace!("skipping malformed set-cookie header"),
                }
                continue;
            }
        }

        match headers.entry(name) {
            Entry::Occupied(mut entry) => {
                let separator: &[u8] = if entry.key() == COOKIE { b"; " } else { b", " };
                let mut folded = BytesMut::with_capacity(entry.get().len() + separator.len() + value.len());
                folded.extend_from_slice(entry.get().as_bytes());
                folded.extend_from_slice(separator);
                folded.extend_from_slice(&value);
                entry.insert(HeaderValue::from_maybe_shared(folded.freeze()).map_err(ParseError::invalid_header)?);
            }
            Entry::Vacant(entry) => {
                entry.insert(HeaderValue::from_maybe_shared(value).map_err(ParseError::invalid_header)?);
            }
        }
    }

    Ok(headers)
}
