//! Head encoding for responses and requests.
//!
//! Header names are written in `Title-Case`. The framing header
//! (`Content-Length` or `Transfer-Encoding`) is derived from the
//! [`PayloadSize`] and replaces whatever the caller set.

use std::io;
use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use http::{HeaderMap, StatusCode, Version};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{PayloadSize, RequestHead, ResponseHead, SendError};
use crate::utils::{FastWrite, put_header_name};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encodes a status line, headers and one `Set-Cookie` per cookie.
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, payload_size) = item;

        dst.reserve(INIT_HEADER_SIZE);
        let version = version_str(head.version)?;
        write!(FastWrite(dst), "{version} {} {}\r\n", head.status.as_str(), reason_phrase(head.status))?;

        payload_size.write_headers(&mut head.headers);
        put_headers(dst, &head.headers);
        for cookie in &head.cookies {
            dst.put_slice(b"Set-Cookie: ");
            write!(FastWrite(dst), "{cookie}")?;
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Encodes a request line and headers.
pub struct RequestHeadEncoder;

impl Encoder<(RequestHead, PayloadSize)> for RequestHeadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (RequestHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, payload_size) = item;

        dst.reserve(INIT_HEADER_SIZE);
        let version = version_str(head.version)?;
        write!(FastWrite(dst), "{} {} {version}\r\n", head.method, head.uri.as_str())?;

        payload_size.write_headers(&mut head.headers);
        put_headers(dst, &head.headers);
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

fn version_str(version: Version) -> Result<&'static str, SendError> {
    match version {
        Version::HTTP_11 => Ok("HTTP/1.1"),
        Version::HTTP_10 => Ok("HTTP/1.0"),
        v => {
            error!(http_version = ?v, "unsupported http version");
            Err(io::Error::from(ErrorKind::Unsupported).into())
        }
    }
}

fn put_headers(dst: &mut BytesMut, headers: &HeaderMap) {
    for (name, value) in headers {
        put_header_name(dst, name.as_str().as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(value.as_bytes());
        dst.put_slice(b"\r\n");
    }
}

/// Reason phrase for the status line, including a few non-registered codes.
pub(crate) fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or(match status.as_u16() {
        306 => "Switch Proxy",
        419 => "Authentication Timeout",
        420 => "Enhance Your Calm",
        _ => "Unknown",
    })
}

#[cfg(test)]
mod tests {
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING};
    use http::{HeaderValue, Method};

    use super::*;
    use crate::protocol::{AttributedCookie, Uri};

    fn encode_response(head: ResponseHead, size: PayloadSize) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, size), &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn status_line_and_length() {
        assert_eq!(encode_response(ResponseHead::default(), PayloadSize::Length(4)), "HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\n");
        assert_eq!(
            encode_response(ResponseHead::default(), PayloadSize::Chunked),
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n"
        );
    }

    #[test]
    fn framing_replaces_caller_headers() {
        let mut head = ResponseHead::default();
        head.headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        head.headers.insert(CONTENT_LENGTH, HeaderValue::from_static("100"));
        head.headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));

        assert_eq!(
            encode_response(head, PayloadSize::Length(4)),
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\n"
        );
    }

    #[test]
    fn cookies_and_bodiless() {
        let head = ResponseHead {
            status: StatusCode::NO_CONTENT,
            cookies: vec![AttributedCookie::new("server", "zewo").path("/")],
            ..Default::default()
        };

        assert_eq!(encode_response(head, PayloadSize::Empty), "HTTP/1.1 204 No Content\r\nSet-Cookie: server=zewo; Path=/\r\n\r\n");
    }

    #[test]
    fn non_registered_reasons() {
        assert_eq!(reason_phrase(StatusCode::from_u16(420).unwrap()), "Enhance Your Calm");
        assert_eq!(reason_phrase(StatusCode::from_u16(419).unwrap()), "Authentication Timeout");
        assert_eq!(reason_phrase(StatusCode::NOT_FOUND), "Not Found");
    }

    #[test]
    fn request_line() {
        let mut head = RequestHead { method: Method::POST, uri: Uri::parse("/users?limit=1").unwrap(), ..Default::default() };
        head.headers.insert(HOST, HeaderValue::from_static("zewo.co"));

        let mut dst = BytesMut::new();
        RequestHeadEncoder.encode((head, PayloadSize::Length(4)), &mut dst).unwrap();
        assert_eq!(&dst[..], b"POST /users?limit=1 HTTP/1.1\r\nHost: zewo.co\r\nContent-Length: 4\r\n\r\n");
    }
}
