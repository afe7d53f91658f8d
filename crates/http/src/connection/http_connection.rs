use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use strand_runtime::Deadline;
use strand_runtime::stream::{Closable, ReceivingStream, SendingStream, Stream, StreamError};
use tracing::{debug, error, info, warn};

use crate::handler::Handler;
use crate::parser::{DEFAULT_BUFFER_SIZE, RequestParser};
use crate::protocol::{HttpError, ParseError, Response, SendError, recover};
use crate::serializer::ResponseSerializer;

/// Drives one stream through parse, handle and serialize until it ends.
///
/// The loop ends when
/// - the peer closes the stream or the pipe breaks (silently),
/// - a read times out (the stream is closed),
/// - a request cannot be parsed (closed without a response, error returned),
/// - the request was not keep-alive (closed after the response),
/// - the response carries an upgrade (the callback gets the raw stream, then it is closed),
/// - the handler fails with an error no status maps to (best-effort 500, closed, error returned).
pub struct HttpConnection<S> {
    stream: S,
    parser: RequestParser,
    serializer: ResponseSerializer,
    timeout: Option<Duration>,
}

impl<S: Stream> HttpConnection<S> {
    pub fn new(stream: S) -> Self {
        Self::with_buffer_size(stream, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(stream: S, buffer_size: usize) -> Self {
        Self { stream, parser: RequestParser::new(buffer_size), serializer: ResponseSerializer::new(), timeout: None }
    }

    /// Bounds each read of a request and each write of a response.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn process<H: Handler + ?Sized>(mut self, handler: &H) -> Result<(), HttpError> {
        while !self.stream.is_closed() {
            let deadline = self.deadline();
            let request = match self.parser.parse(&mut self.stream, deadline).await {
                Ok(request) => request,
                Err(e) => return self.on_parse_error(e).await,
            };

            let keep_alive = request.is_keep_alive();
            let mut response = match handler.call(request).await {
                Ok(response) => response,
                Err(e) => match recover(&e) {
                    Some(response) => response,
                    None => {
                        error!(cause = %e, "handler failed, sending 500");
                        self.send_fallback().await;
                        self.shutdown().await;
                        return Err(HttpError::HandlerError { source: e });
                    }
                },
            };

            let upgrade = response.take_upgrade();
            let deadline = self.deadline();
            if let Err(e) = self.serializer.serialize(&mut self.stream, response, deadline).await {
                return self.on_send_error(e).await;
            }

            if let Some(upgrade) = upgrade {
                info!("switching protocols");
                let mut raw = Rewind { buffered: self.parser.take_buffered(), stream: &mut self.stream };
                let result = upgrade(&mut raw).await;
                self.shutdown().await;
                return match result {
                    Ok(()) => Ok(()),
                    Err(e) if e.is_disconnect() => Ok(()),
                    Err(e) => Err(SendError::from(e).into()),
                };
            }

            if !keep_alive {
                self.shutdown().await;
            }
        }

        Ok(())
    }

    fn deadline(&self) -> Deadline {
        self.timeout.map_or(Deadline::never(), Deadline::after)
    }

    async fn on_parse_error(&mut self, e: ParseError) -> Result<(), HttpError> {
        match e {
            ParseError::Stream { source } if source.is_disconnect() => {
                debug!("peer closed the connection");
                Ok(())
            }
            ParseError::Stream { source: StreamError::Timeout } => {
                info!("read timed out, closing connection");
                self.shutdown().await;
                Ok(())
            }
            e => {
                warn!(cause = %e, "can't parse request, closing connection");
                self.shutdown().await;
                Err(e.into())
            }
        }
    }

    async fn on_send_error(&mut self, e: SendError) -> Result<(), HttpError> {
        match e {
            SendError::Stream { source } if source.is_disconnect() => {
                debug!("peer went away while sending the response");
                Ok(())
            }
            e => {
                error!(cause = %e, "can't send response, closing connection");
                self.shutdown().await;
                Err(e.into())
            }
        }
    }

    async fn send_fallback(&mut self) {
        let response = Response::new(StatusCode::INTERNAL_SERVER_ERROR);
        let deadline = self.deadline();
        if let Err(e) = self.serializer.serialize(&mut self.stream, response, deadline).await {
            debug!(cause = %e, "can't send 500 response");
        }
    }

    async fn shutdown(&mut self) {
        if self.stream.is_closed() {
            return;
        }
        if let Err(e) = self.stream.close().await {
            debug!(cause = %e, "error while closing stream");
        }
    }
}

/// The raw stream handed to an upgrade, replaying bytes the parser read ahead.
struct Rewind<'a, S> {
    buffered: Bytes,
    stream: &'a mut S,
}

#[async_trait]
impl<S: Stream> Closable for Rewind<'_, S> {
    async fn close(&mut self) -> Result<(), StreamError> {
        self.buffered.clear();
        self.stream.close().await
    }

    fn is_closed(&self) -> bool {
        self.stream.is_closed()
    }
}

#[async_trait]
impl<S: Stream> ReceivingStream for Rewind<'_, S> {
    async fn receive(&mut self, up_to: usize, deadline: Deadline) -> Result<Bytes, StreamError> {
        if self.buffered.is_empty() {
            return self.stream.receive(up_to, deadline).await;
        }
        let size = up_to.max(1).min(self.buffered.len());
        Ok(self.buffered.split_to(size))
    }
}

#[async_trait]
impl<S: Stream> SendingStream for Rewind<'_, S> {
    async fn send(&mut self, bytes: &[u8], deadline: Deadline) -> Result<(), StreamError> {
        self.stream.send(bytes, deadline).await
    }

    async fn flush(&mut self, deadline: Deadline) -> Result<(), StreamError> {
        self.stream.flush(deadline).await
    }
}
