//! Message serialization onto a [`SendingStream`].
//!
//! Buffered bodies are written with `Content-Length`. Receivers and senders
//! are written with chunked framing as they produce data, holding at most
//! one chunk in memory.

use std::marker::PhantomData;

use bytes::BytesMut;
use strand_runtime::Deadline;
use strand_runtime::stream::{ReceivingStream, SendingStream, StreamError};
use tokio_util::codec::Encoder;
use tracing::{trace, warn};

use crate::codec::{MessageEncoder, RequestEncoder, ResponseEncoder};
use crate::codec::header::{HeaderEncoder, RequestHeadEncoder};
use crate::protocol::{Body, Message, PayloadItem, PayloadSize, Request, RequestHead, Response, ResponseHead, SendError};

/// Size of the reads from a streaming body.
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

pub struct ResponseSerializer {
    writer: MessageWriter<HeaderEncoder, ResponseHead>,
}

impl ResponseSerializer {
    pub fn new() -> Self {
        Self { writer: MessageWriter::new(ResponseEncoder::new(), DEFAULT_CHUNK_SIZE) }
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { writer: MessageWriter::new(ResponseEncoder::new(), chunk_size) }
    }

    /// Writes `response` and flushes the stream.
    ///
    /// An upgrade callback on the response is not invoked here.
    pub async fn serialize<S: SendingStream + ?Sized>(
        &mut self,
        stream: &mut S,
        response: Response,
        deadline: Deadline,
    ) -> Result<(), SendError> {
        let (head, mut body) = response.into_parts();
        trace!(status = head.status.as_u16(), "serialize response");

        if head.is_bodiless() {
            if !matches!(&body, Body::Buffer(bytes) if bytes.is_empty()) {
                warn!(status = head.status.as_u16(), "dropping body of a bodiless response");
            }
            return self.writer.write_head(stream, head, PayloadSize::Empty, deadline).await;
        }

        self.writer.write(stream, head, &mut body, deadline).await
    }
}

impl Default for ResponseSerializer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RequestSerializer {
    writer: MessageWriter<RequestHeadEncoder, RequestHead>,
}

impl RequestSerializer {
    pub fn new() -> Self {
        Self { writer: MessageWriter::new(RequestEncoder::new(), DEFAULT_CHUNK_SIZE) }
    }

    /// Writes `request` and flushes the stream. An empty buffer is sent without framing headers.
    pub async fn serialize<S: SendingStream + ?Sized>(
        &mut self,
        stream: &mut S,
        request: Request,
        deadline: Deadline,
    ) -> Result<(), SendError> {
        let (head, mut body) = request.into_parts();
        trace!(method = %head.method, uri = head.uri.as_str(), "serialize request");

        if matches!(&body, Body::Buffer(bytes) if bytes.is_empty()) {
            return self.writer.write_head(stream, head, PayloadSize::Empty, deadline).await;
        }

        self.writer.write(stream, head, &mut body, deadline).await
    }
}

impl Default for RequestSerializer {
    fn default() -> Self {
        Self::new()
    }
}

struct MessageWriter<E, H> {
    encoder: MessageEncoder<E>,
    buffer: BytesMut,
    chunk_size: usize,
    _head: PhantomData<fn(H)>,
}

impl<E, H> MessageWriter<E, H>
where
    MessageEncoder<E>: Encoder<Message<(H, PayloadSize)>, Error = SendError>,
{
    fn new(encoder: MessageEncoder<E>, chunk_size: usize) -> Self {
        Self { encoder, buffer: BytesMut::new(), chunk_size: chunk_size.max(1), _head: PhantomData }
    }

    async fn write<S: SendingStream + ?Sized>(
        &mut self,
        stream: &mut S,
        head: H,
        body: &mut Body,
        deadline: Deadline,
    ) -> Result<(), SendError> {
        if let Body::Buffer(bytes) = body {
            let bytes = bytes.clone();
            self.encode(Message::Header((head, PayloadSize::Length(bytes.len() as u64))))?;
            if !bytes.is_empty() {
                self.encode(Message::from(bytes))?;
            }
            self.encode(Message::Payload(PayloadItem::Eof))?;
            return self.flush(stream, deadline).await;
        }

        let receiver = body.become_receiver()?;
        self.encode(Message::Header((head, PayloadSize::Chunked)))?;
        self.send(stream, deadline).await?;

        loop {
            match receiver.receive(self.chunk_size, deadline).await {
                Ok(bytes) => {
                    self.encode(Message::from(bytes))?;
                    self.send(stream, deadline).await?;
                }
                Err(StreamError::Closed) => break,
                Err(e) => {
                    self.buffer.clear();
                    return Err(e.into());
                }
            }
        }

        self.encode(Message::Payload(PayloadItem::Eof))?;
        self.flush(stream, deadline).await
    }

    async fn write_head<S: SendingStream + ?Sized>(
        &mut self,
        stream: &mut S,
        head: H,
        payload_size: PayloadSize,
        deadline: Deadline,
    ) -> Result<(), SendError> {
        self.encode(Message::Header((head, payload_size)))?;
        self.flush(stream, deadline).await
    }

    fn encode(&mut self, item: Message<(H, PayloadSize)>) -> Result<(), SendError> {
        let result = self.encoder.encode(item, &mut self.buffer);
        if result.is_err() {
            self.buffer.clear();
        }
        result
    }

    async fn send<S: SendingStream + ?Sized>(&mut self, stream: &mut S, deadline: Deadline) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = stream.send(&self.buffer, deadline).await;
        self.buffer.clear();
        Ok(result?)
    }

    async fn flush<S: SendingStream + ?Sized>(&mut self, stream: &mut S, deadline: Deadline) -> Result<(), SendError> {
        self.send(stream, deadline).await?;
        Ok(stream.flush(deadline).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
    use http::{HeaderValue, Method, StatusCode};
    use indoc::indoc;
    use strand_runtime::stream::{Closable, MemoryStream};

    use super::*;
    use crate::parser::{RequestParser, ResponseParser};
    use crate::protocol::{AttributedCookie, Uri};

    async fn serialize(response: Response) -> String {
        let mut stream = MemoryStream::default();
        ResponseSerializer::new().serialize(&mut stream, response, Deadline::never()).await.unwrap();
        String::from_utf8(stream.into_output().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn buffer_body() {
        let response = Response::with_body(StatusCode::OK, "text");
        assert_eq!(serialize(response).await, "HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntext");
    }

    #[tokio::test]
    async fn receiver_body() {
        let response = Response::with_receiver(StatusCode::OK, MemoryStream::new("text"));
        assert_eq!(serialize(response).await, "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\ntext\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn sender_body() {
        let response = Response::with_sender(StatusCode::OK, |mut sink| async move {
            sink.send(b"text", Deadline::never()).await
        });
        assert_eq!(serialize(response).await, "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\ntext\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn sender_chunks_follow_sends() {
        let response = Response::with_sender(StatusCode::OK, |mut sink| async move {
            sink.send(b"Hello, ", Deadline::never()).await?;
            strand_runtime::nap(Duration::from_millis(1)).await;
            sink.send(b"streaming world", Deadline::never()).await
        });

        let expected = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n7\r\nHello, \r\nF\r\nstreaming world\r\n0\r\n\r\n";
        assert_eq!(serialize(response).await, expected);
    }

    #[tokio::test]
    async fn receiver_is_read_in_chunks() {
        let mut stream = MemoryStream::default();
        let response = Response::with_receiver(StatusCode::OK, MemoryStream::new("abcdefghij"));
        ResponseSerializer::with_chunk_size(4).serialize(&mut stream, response, Deadline::never()).await.unwrap();

        let output = String::from_utf8(stream.into_output().to_vec()).unwrap();
        assert!(output.ends_with("\r\n\r\n4\r\nabcd\r\n4\r\nefgh\r\n2\r\nij\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn headers_and_cookies() {
        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .cookie(AttributedCookie::new("session", "abc").http_only(true))
            .body("done")
            .build();

        let expected = indoc! {r"
            HTTP/1.1 201 Created
            Content-Type: text/plain
            Content-Length: 4
            Set-Cookie: session=abc; HttpOnly

            done"};
        assert_eq!(serialize(response).await, expected.replace('\n', "\r\n"));
    }

    #[tokio::test]
    async fn bodiless_statuses_have_no_framing() {
        assert_eq!(serialize(Response::new(StatusCode::NO_CONTENT)).await, "HTTP/1.1 204 No Content\r\n\r\n");
        assert_eq!(serialize(Response::new(StatusCode::CONTINUE)).await, "HTTP/1.1 100 Continue\r\n\r\n");
        assert_eq!(serialize(Response::new(StatusCode::NOT_FOUND)).await, "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn stream_errors_propagate() {
        let response = Response::with_sender(StatusCode::OK, |mut sink| async move {
            sink.send(b"partial", Deadline::never()).await?;
            Err(StreamError::Timeout)
        });

        let mut stream = MemoryStream::default();
        let result = ResponseSerializer::new().serialize(&mut stream, response, Deadline::never()).await;
        assert!(matches!(result, Err(SendError::Stream { source: StreamError::Timeout })));
    }

    #[tokio::test]
    async fn closed_stream_is_reported() {
        let mut stream = MemoryStream::default();
        stream.close().await.unwrap();

        let result = ResponseSerializer::new().serialize(&mut stream, Response::with_body(StatusCode::OK, "text"), Deadline::never()).await;
        assert!(matches!(result, Err(SendError::Stream { source: StreamError::Closed })));
    }

    #[tokio::test]
    async fn response_round_trip() {
        let response = Response::builder()
            .status(StatusCode::from_u16(420).unwrap())
            .cookie(AttributedCookie::new("lang", "rust"))
            .body("Zewo")
            .build();

        let mut stream = MemoryStream::default();
        ResponseSerializer::new().serialize(&mut stream, response, Deadline::never()).await.unwrap();

        let mut wire = MemoryStream::new(stream.into_output());
        let parsed = ResponseParser::default().parse(&mut wire, Deadline::never()).await.unwrap();
        assert_eq!(parsed.status().as_u16(), 420);
        assert_eq!(parsed.headers()[CONTENT_LENGTH], "4");
        assert_eq!(parsed.cookies(), [AttributedCookie::new("lang", "rust")]);
        assert_eq!(parsed.bytes(), Some(&Bytes::from_static(b"Zewo")));
    }

    #[tokio::test]
    async fn request_round_trip() {
        let request = Request::builder()
            .method(Method::POST)
            .uri(Uri::parse("/users?limit=1").unwrap())
            .header(HOST, HeaderValue::from_static("zewo.co"))
            .body(Body::sender(|mut sink| async move { sink.send(b"Zewo", Deadline::never()).await }))
            .build();

        let mut stream = MemoryStream::default();
        RequestSerializer::new().serialize(&mut stream, request, Deadline::never()).await.unwrap();
        assert_eq!(
            stream.output(),
            b"POST /users?limit=1 HTTP/1.1\r\nHost: zewo.co\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nZewo\r\n0\r\n\r\n"
        );

        let mut wire = MemoryStream::new(stream.into_output());
        let parsed = RequestParser::default().parse(&mut wire, Deadline::never()).await.unwrap();
        assert_eq!(parsed.method(), Method::POST);
        assert_eq!(parsed.uri().query(), Some("limit=1"));
        assert_eq!(parsed.body(), &Body::from("Zewo"));
    }

    #[tokio::test]
    async fn empty_request_has_no_framing() {
        let mut stream = MemoryStream::default();
        RequestSerializer::new().serialize(&mut stream, Request::default(), Deadline::never()).await.unwrap();
        assert_eq!(stream.output(), b"GET / HTTP/1.1\r\n\r\n");
    }
}
