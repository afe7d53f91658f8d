//! Decoder for `Transfer-Encoding: chunked` bodies.
//!
//! A byte-level state machine, so a body split at any position decodes to
//! the same bytes. Chunk extensions and trailer fields are skipped.

use std::cmp;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

use State::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
    remaining: u64,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: Size { digits: 0 }, remaining: 0 }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// hex digits of the chunk size
    Size { digits: u8 },
    /// whitespace after the size
    SizeLws,
    /// `;name=value` extensions, ignored
    Extension,
    SizeLf,
    Data,
    DataCr,
    DataLf,
    /// a trailer field line, ignored
    Trailer,
    TrailerLf,
    EndCr,
    EndLf,
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == End {
                trace!("chunked body complete");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                return Ok(None);
            }

            if self.state == Data {
                let size = cmp::min(self.remaining, src.len() as u64) as usize;
                self.remaining -= size as u64;
                if self.remaining == 0 {
                    self.state = DataCr;
                }
                trace!(size, "read chunk data");
                return Ok(Some(PayloadItem::Chunk(src.split_to(size).freeze())));
            }

            self.state = self.step(src.get_u8())?;
        }
    }
}

impl ChunkedDecoder {
    /// Consumes one framing byte.
    fn step(&mut self, byte: u8) -> Result<State, ParseError> {
        let next = match (self.state, byte) {
            (Size { digits }, b) if b.is_ascii_hexdigit() => {
                // 16 hex digits already fill a u64
                if digits >= 16 {
                    return Err(ParseError::invalid_body("chunk size overflow"));
                }
                let value = (b as char).to_digit(16).map(u64::from).unwrap_or_default();
                self.remaining = (self.remaining << 4) | value;
                Size { digits: digits + 1 }
            }
            (Size { digits: 0 }, _) => return Err(ParseError::invalid_body("missing chunk size")),
            (Size { .. } | SizeLws, b'\t' | b' ') => SizeLws,
            (Size { .. } | SizeLws, b';') => Extension,
            (Size { .. } | SizeLws | Extension, b'\r') => SizeLf,
            (Size { .. } | SizeLws, _) => return Err(ParseError::invalid_body("invalid chunk size line")),

            (Extension, b'\n') => return Err(ParseError::invalid_body("bare LF in chunk extension")),
            (Extension, _) => Extension,

            (SizeLf, b'\n') if self.remaining == 0 => EndCr,
            (SizeLf, b'\n') => Data,
            (SizeLf, _) => return Err(ParseError::invalid_body("expected LF after chunk size")),

            (DataCr, b'\r') => DataLf,
            (DataCr, _) => return Err(ParseError::invalid_body("expected CR after chunk data")),
            (DataLf, b'\n') => Size { digits: 0 },
            (DataLf, _) => return Err(ParseError::invalid_body("expected LF after chunk data")),

            (EndCr, b'\r') => EndLf,
            (Trailer, b'\r') => TrailerLf,
            (EndCr | Trailer, _) => Trailer,
            (TrailerLf, b'\n') => EndCr,
            (TrailerLf, _) => return Err(ParseError::invalid_body("expected LF after trailer")),
            (EndLf, b'\n') => End,
            (EndLf, _) => return Err(ParseError::invalid_body("expected LF after last chunk")),

            (Data | End, _) => self.state,
        };
        Ok(next)
    }
}
