//! Incremental message parsing over a [`ReceivingStream`].
//!
//! A parser owns a read buffer that outlives a single message: bytes read
//! past the end of one message stay buffered for the next call, so pipelined
//! keep-alive traffic is parsed without loss. The result does not depend on
//! how the peer's bytes are split across reads.

use bytes::{Bytes, BytesMut};
use http::Method;
use strand_runtime::Deadline;
use strand_runtime::stream::{ReceivingStream, Stream, StreamError};
use tokio_util::codec::Decoder;
use tracing::{debug, trace};

use crate::codec::{MessageDecoder, RequestDecoder, ResponseDecoder};
use crate::codec::header::{HeaderDecoder, ResponseHeadDecoder};
use crate::protocol::{Body, Message, ParseError, PayloadItem, Request, Response};
use crate::utils::ensure;

/// Read size used when none is given.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// Reads requests one at a time from a stream.
pub struct RequestParser {
    reader: MessageReader<HeaderDecoder>,
}

impl RequestParser {
    pub fn new(buffer_size: usize) -> Self {
        Self { reader: MessageReader::new(buffer_size, RequestDecoder::new()) }
    }

    /// Reads the next request, body included.
    ///
    /// `Expect: 100-continue` is answered on `stream` before the body is read.
    /// On error the buffered bytes are discarded.
    pub async fn parse<S: Stream + ?Sized>(&mut self, stream: &mut S, deadline: Deadline) -> Result<Request, ParseError> {
        let result = self.parse_request(stream, deadline).await;
        if result.is_err() {
            self.reader.reset();
        }
        result
    }

    async fn parse_request<S: Stream + ?Sized>(&mut self, stream: &mut S, deadline: Deadline) -> Result<Request, ParseError> {
        let Message::Header((head, payload_size)) = self.reader.next(stream, deadline).await? else {
            return Err(ParseError::invalid_body("body data before request head"));
        };
        trace!(method = %head.method, uri = head.uri.as_str(), ?payload_size, "parsed request head");

        if head.expects_continue() && !payload_size.is_empty() {
            stream.send(CONTINUE, deadline).await?;
            stream.flush(deadline).await?;
        }

        let body = self.reader.read_body(stream, deadline).await?;

        if head.method == Method::CONNECT {
            ensure!(self.reader.buffer.is_empty(), ParseError::UnexpectedData);
        }

        Ok(head.into_request(Body::Buffer(body)))
    }

    /// Takes the bytes read past the last parsed request.
    pub fn take_buffered(&mut self) -> Bytes {
        self.reader.buffer.split().freeze()
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

/// Reads responses one at a time from a stream.
pub struct ResponseParser {
    reader: MessageReader<ResponseHeadDecoder>,
}

impl ResponseParser {
    pub fn new(buffer_size: usize) -> Self {
        Self { reader: MessageReader::new(buffer_size, ResponseDecoder::new()) }
    }

    pub async fn parse<S: ReceivingStream + ?Sized>(
        &mut self,
        stream: &mut S,
        deadline: Deadline,
    ) -> Result<Response, ParseError> {
        let result = self.parse_response(stream, deadline).await;
        if result.is_err() {
            self.reader.reset();
        }
        result
    }

    async fn parse_response<S: ReceivingStream + ?Sized>(
        &mut self,
        stream: &mut S,
        deadline: Deadline,
    ) -> Result<Response, ParseError> {
        let Message::Header((head, payload_size)) = self.reader.next(stream, deadline).await? else {
            return Err(ParseError::invalid_body("body data before response head"));
        };
        trace!(status = head.status.as_u16(), ?payload_size, "parsed response head");

        let body = self.reader.read_body(stream, deadline).await?;
        Ok(head.into_response(Body::Buffer(body)))
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

/// A message decoder fed from a stream through a persistent buffer.
struct MessageReader<D> {
    buffer_size: usize,
    buffer: BytesMut,
    decoder: MessageDecoder<D>,
}

impl<D> MessageReader<D>
where
    MessageDecoder<D>: Decoder<Error = ParseError>,
{
    fn new(buffer_size: usize, decoder: MessageDecoder<D>) -> Self {
        let buffer_size = buffer_size.max(1);
        Self { buffer_size, buffer: BytesMut::with_capacity(buffer_size), decoder }
    }

    /// Decodes the next event, receiving more bytes while the buffer is short.
    async fn next<R: ReceivingStream + ?Sized>(
        &mut self,
        stream: &mut R,
        deadline: Deadline,
    ) -> Result<<MessageDecoder<D> as Decoder>::Item, ParseError> {
        loop {
            if let Some(message) = self.decoder.decode(&mut self.buffer)? {
                return Ok(message);
            }

            let bytes = match stream.receive(self.buffer_size, deadline).await {
                Ok(bytes) => bytes,
                Err(StreamError::Closed) if self.decoder.is_idle() && !self.buffer.is_empty() => {
                    return Err(ParseError::invalid_header("stream closed inside a message head"));
                }
                Err(e) => return Err(e.into()),
            };
            self.buffer.extend_from_slice(&bytes);
        }
    }

    fn reset(&mut self) {
        debug!(discarded = self.buffer.len(), "reset parser");
        self.buffer.clear();
        self.decoder.reset();
    }
}

impl<D, H> MessageReader<D>
where
    MessageDecoder<D>: Decoder<Item = Message<H>, Error = ParseError>,
{
    /// Collects body chunks up to the end of the current message.
    async fn read_body<R: ReceivingStream + ?Sized>(&mut self, stream: &mut R, deadline: Deadline) -> Result<Bytes, ParseError> {
        let mut body = BytesMut::new();
        loop {
            match self.next(stream, deadline).await? {
                Message::Payload(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
                Message::Payload(PayloadItem::Eof) => return Ok(body.freeze()),
                Message::Header(_) => return Err(ParseError::invalid_body("message head inside body")),
            }
        }
    }
}
