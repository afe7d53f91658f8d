use std::io;
use std::io::ErrorKind;

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::PayloadEncoder;
use crate::codec::header::{HeaderEncoder, RequestHeadEncoder};
use crate::protocol::{Message, PayloadSize, SendError};

pub type ResponseEncoder = MessageEncoder<HeaderEncoder>;

pub type RequestEncoder = MessageEncoder<RequestHeadEncoder>;

/// Encodes a head followed by its body items.
///
/// A head is only accepted once the previous body has been finished.
pub struct MessageEncoder<E> {
    header_encoder: E,
    payload_encoder: Option<PayloadEncoder>,
}

impl MessageEncoder<HeaderEncoder> {
    pub fn new() -> Self {
        Self { header_encoder: HeaderEncoder, payload_encoder: None }
    }
}

impl Default for MessageEncoder<HeaderEncoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageEncoder<RequestHeadEncoder> {
    pub fn new() -> Self {
        Self { header_encoder: RequestHeadEncoder, payload_encoder: None }
    }
}

impl Default for MessageEncoder<RequestHeadEncoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, E> Encoder<Message<(H, PayloadSize)>> for MessageEncoder<E>
where
    E: Encoder<(H, PayloadSize), Error = SendError>,
{
    type Error = SendError;

    fn encode(&mut self, item: Message<(H, PayloadSize)>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive message head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                self.header_encoder.encode((head, payload_size), dst)?;
                let payload_encoder = PayloadEncoder::from(payload_size);
                if !payload_encoder.is_finish() {
                    self.payload_encoder = Some(payload_encoder);
                }
                Ok(())
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    // bodiless messages may still be terminated with an explicit eof
                    if payload_item.is_eof() {
                        return Ok(());
                    }
                    error!("expect message head but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                };

                let is_eof = payload_item.is_eof();
                let result = payload_encoder.encode(payload_item, dst);
                if is_eof || result.is_err() {
                    self.payload_encoder = None;
                }
                result
            }
        }
    }
}
