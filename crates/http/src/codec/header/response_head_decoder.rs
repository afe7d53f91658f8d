use bytes::BytesMut;
use http::StatusCode;
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::header_decoder::{
    EMPTY_HEADER_INDEX, HeaderIndex, MAX_HEADER_BYTES, MAX_HEADER_NUM, collect_headers, from_httparse, parse_version,
};
use crate::protocol::{ParseError, PayloadSize, ResponseHead};
use crate::utils::ensure;

/// Decodes a status line and its header fields.
///
/// `Set-Cookie` fields are parsed into [`ResponseHead::cookies`].
pub struct ResponseHeadDecoder;

impl Decoder for ResponseHeadDecoder {
    type Item = (ResponseHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut res = httparse::Response::new(&mut headers);

        let body_offset = match res.parse(src).map_err(from_httparse)? {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };
        trace!(head_size = body_offset, "parsed response head");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = parse_version(res.version)?;
        let code = res.code.unwrap_or_default();
        let status = StatusCode::from_u16(code).map_err(|_e| ParseError::invalid_status(code))?;

        let header_count = res.headers.len();
        let mut indices = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];
        HeaderIndex::record(src, res.headers, &mut indices);

        let head_bytes = src.split_to(body_offset).freeze();
        let mut cookies = Vec::new();
        let headers = collect_headers(&head_bytes, &indices[..header_count], Some(&mut cookies))?;

        let payload_size = PayloadSize::from_headers(&headers)?;
        Ok(Some((ResponseHead { status, version, headers, cookies }, payload_size)))
    }
}
