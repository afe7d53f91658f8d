//! Decoder for bodies framed by `Content-Length`.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::protocol::{ParseError, PayloadItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// bytes still expected
    remaining: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length }
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.remaining == 0 {
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let size = self.remaining.min(src.len() as u64) as usize;
        self.remaining -= size as u64;
        Ok(Some(PayloadItem::Chunk(src.split_to(size).freeze())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_length() {
        let mut buffer = BytesMut::from(&b"101234567890abcdef\r\n\r\n"[..]);
        let mut decoder = LengthDecoder::new(10);

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&item.as_bytes().unwrap()[..], b"1012345678");
        assert_eq!(&buffer[..], b"90abcdef\r\n\r\n");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
    }

    #[test]
    fn waits_for_more() {
        let mut buffer = BytesMut::from(&b"Ze"[..]);
        let mut decoder = LengthDecoder::new(4);

        assert_eq!(decoder.decode(&mut buffer).unwrap().and_then(PayloadItem::into_bytes).unwrap(), "Ze");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"wo");
        assert_eq!(decoder.decode(&mut buffer).unwrap().and_then(PayloadItem::into_bytes).unwrap(), "wo");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
    }

    #[test]
    fn zero_length() {
        let mut buffer = BytesMut::from(&b"GET"[..]);
        assert_eq!(LengthDecoder::new(0).decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
        assert_eq!(buffer.len(), 3);
    }
}
