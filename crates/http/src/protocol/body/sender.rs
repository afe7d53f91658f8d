use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use strand_runtime::stream::{Closable, ReceivingStream, SendingStream, StreamError};
use strand_runtime::{Channel, ChannelError, Deadline, SendError};

use crate::protocol::BodyError;

type Producer = Box<dyn FnOnce(BodySink) -> BoxFuture<'static, Result<(), StreamError>> + Send>;

/// A push-based body: a producer writing into a [`BodySink`].
///
/// The producer runs at most once.
pub struct BodySender {
    producer: Option<Producer>,
}

impl BodySender {
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(BodySink) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StreamError>> + Send + 'static,
    {
        Self { producer: Some(Box::new(move |sink| producer(sink).boxed())) }
    }

    pub fn is_consumed(&self) -> bool {
        self.producer.is_none()
    }

    /// Turns the producer into a pull-based stream.
    ///
    /// The producer only makes progress while the stream is being received from.
    pub fn take_stream(&mut self) -> Result<SenderStream, BodyError> {
        let producer = self.producer.take().ok_or(BodyError::Consumed)?;
        let channel = Channel::new();
        let future = producer(BodySink { channel: channel.clone() });
        Ok(SenderStream { channel, producer: Some(future), pending: Bytes::new(), closed: false })
    }
}

impl fmt::Debug for BodySender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySender").field("consumed", &self.is_consumed()).finish()
    }
}

/// The sink handed to a [`BodySender`] producer.
///
/// Every `send` is one chunk of the body. Dropping the sink ends the body.
pub struct BodySink {
    channel: Channel<Bytes>,
}

impl fmt::Debug for BodySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySink").field("closed", &self.channel.is_closed()).finish()
    }
}

#[async_trait]
impl Closable for BodySink {
    async fn close(&mut self) -> Result<(), StreamError> {
        if self.channel.is_closed() {
            return Err(StreamError::Closed);
        }
        self.channel.close();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }
}

#[async_trait]
impl SendingStream for BodySink {
    async fn send(&mut self, bytes: &[u8], deadline: Deadline) -> Result<(), StreamError> {
        if bytes.is_empty() {
            return Ok(());
        }

        match self.channel.send(Bytes::copy_from_slice(bytes), deadline).await {
            Ok(()) => Ok(()),
            Err(SendError::Closed(_)) => Err(StreamError::Closed),
            Err(SendError::Timeout(_)) => Err(StreamError::Timeout),
        }
    }

    async fn flush(&mut self, _deadline: Deadline) -> Result<(), StreamError> {
        if self.channel.is_closed() { Err(StreamError::Closed) } else { Ok(()) }
    }
}

impl Drop for BodySink {
    fn drop(&mut self) {
        self.channel.close();
    }
}

/// Receiving end of a [`BodySender`], driving the producer as it is polled.
pub struct SenderStream {
    channel: Channel<Bytes>,
    producer: Option<BoxFuture<'static, Result<(), StreamError>>>,
    pending: Bytes,
    closed: bool,
}

enum Step {
    Produced(Result<(), StreamError>),
    Received(Result<Bytes, ChannelError>),
}

impl fmt::Debug for SenderStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderStream")
            .field("producing", &self.producer.is_some())
            .field("pending", &self.pending.len())
            .field("closed", &self.closed)
            .finish()
    }
}

#[async_trait]
impl Closable for SenderStream {
    async fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.closed = true;
        self.producer = None;
        self.channel.close();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl ReceivingStream for SenderStream {
    async fn receive(&mut self, up_to: usize, deadline: Deadline) -> Result<Bytes, StreamError> {
        let up_to = up_to.max(1);
        loop {
            if self.closed {
                return Err(StreamError::Closed);
            }

            if !self.pending.is_empty() {
                let size = up_to.min(self.pending.len());
                return Ok(self.pending.split_to(size));
            }

            let step = match self.producer.as_mut() {
                Some(producer) => tokio::select! {
                    result = producer => Step::Produced(result),
                    received = self.channel.receive(deadline) => Step::Received(received),
                },
                None => Step::Received(self.channel.receive(deadline).await),
            };

            match step {
                Step::Produced(result) => {
                    self.producer = None;
                    if let Err(e) = result {
                        self.closed = true;
                        self.channel.close();
                        return Err(e);
                    }
                }
                Step::Received(Ok(bytes)) => self.pending = bytes,
                Step::Received(Err(ChannelError::Timeout)) => return Err(StreamError::Timeout),
                Step::Received(Err(ChannelError::Closed)) => {
                    if self.producer.is_none() {
                        self.closed = true;
                        return Err(StreamError::Closed);
                    }
                    // the sink was dropped early, let the producer finish to surface its result
                    if let Some(producer) = self.producer.take() {
                        producer.await?;
                    }
                }
            }
        }
    }
}

impl Drop for SenderStream {
    fn drop(&mut self) {
        self.channel.close();
    }
}
