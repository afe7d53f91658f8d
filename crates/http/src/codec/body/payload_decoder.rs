//! Body decoding, dispatched on the framing found in the head.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{ParseError, PayloadItem, PayloadSize};

/// Reads one body in the framing its head announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadDecoder {
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    /// Yields `Eof` at once without touching the buffer.
    Empty,
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(size: PayloadSize) -> Self {
        match size {
            PayloadSize::Length(n) => PayloadDecoder::Length(LengthDecoder::new(n)),
            PayloadSize::Chunked => PayloadDecoder::Chunked(ChunkedDecoder::new()),
            PayloadSize::Empty => PayloadDecoder::Empty,
        }
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self {
            PayloadDecoder::Length(decoder) => decoder.decode(src),
            PayloadDecoder::Chunked(decoder) => decoder.decode(src),
            PayloadDecoder::Empty => Ok(Some(PayloadItem::Eof)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(decoder: &mut PayloadDecoder, src: &mut BytesMut) -> Vec<u8> {
        let mut body = Vec::new();
        while let Some(item) = decoder.decode(src).unwrap() {
            match item {
                PayloadItem::Chunk(bytes) => body.extend_from_slice(&bytes),
                PayloadItem::Eof => break,
            }
        }
        body
    }

    #[test]
    fn each_framing_stops_at_its_end() {
        let mut src = BytesMut::from("ZewoGET");
        assert_eq!(drain(&mut PayloadSize::Length(4).into(), &mut src), b"Zewo");
        assert_eq!(&src[..], b"GET");

        let mut src = BytesMut::from("4\r\nZewo\r\n0\r\n\r\nGET");
        assert_eq!(drain(&mut PayloadSize::Chunked.into(), &mut src), b"Zewo");
        assert_eq!(&src[..], b"GET");

        let mut src = BytesMut::from("GET");
        assert!(drain(&mut PayloadSize::Empty.into(), &mut src).is_empty());
        assert_eq!(&src[..], b"GET");
    }
}
