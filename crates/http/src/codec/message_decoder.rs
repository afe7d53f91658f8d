//! Head-then-body decoding of whole messages.
//!
//! [`MessageDecoder`] alternates between a head decoder and a
//! [`PayloadDecoder`]: it yields one `Message::Header`, then the body as
//! `Message::Payload(Chunk)` items, then `Message::Payload(Eof)`, and is then
//! ready for the next message in the same buffer.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{HeaderDecoder, ResponseHeadDecoder};
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize};

pub type RequestDecoder = MessageDecoder<HeaderDecoder>;

pub type ResponseDecoder = MessageDecoder<ResponseHeadDecoder>;

pub struct MessageDecoder<D> {
    header_decoder: D,
    /// `Some` while a body is being read
    payload_decoder: Option<PayloadDecoder>,
}

impl MessageDecoder<HeaderDecoder> {
    pub fn new() -> Self {
        Self { header_decoder: HeaderDecoder, payload_decoder: None }
    }
}

impl Default for MessageDecoder<HeaderDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageDecoder<ResponseHeadDecoder> {
    pub fn new() -> Self {
        Self { header_decoder: ResponseHeadDecoder, payload_decoder: None }
    }
}

impl Default for MessageDecoder<ResponseHeadDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> MessageDecoder<D> {
    /// Whether the decoder sits between two messages.
    pub fn is_idle(&self) -> bool {
        self.payload_decoder.is_none()
    }

    /// Drops any partially decoded message.
    pub fn reset(&mut self) {
        self.payload_decoder = None;
    }
}

impl<H, D> Decoder for MessageDecoder<D>
where
    D: Decoder<Item = (H, PayloadSize), Error = ParseError>,
{
    type Item = Message<(H, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    self.payload_decoder = None;
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        let message = match self.header_decoder.decode(src)? {
            Some((head, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((head, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }
}
