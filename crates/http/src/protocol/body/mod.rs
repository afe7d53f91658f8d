//! Message bodies.
//!
//! # Components
//!
//! - [`Body`]: a buffer, a pull-based receiver or a push-based sender
//! - [`BodySender`] / [`BodySink`]: producer side of a push-based body
//! - [`SenderStream`]: adapts a sender into a receiver
//!
//! Streaming bodies are single-use: once drained they cannot be read again.
//! Converting to a buffer replaces the body in place, so later conversions
//! are cheap.

mod sender;

pub use sender::{BodySender, BodySink, SenderStream};

use std::fmt;
use std::future::Future;
use std::mem;

use bytes::{Bytes, BytesMut};
use strand_runtime::Deadline;
use strand_runtime::stream::{MemoryStream, ReceivingStream, SendingStream, StreamError};

use crate::protocol::BodyError;

/// Read size used when draining a receiver.
const DRAIN_CHUNK_SIZE: usize = 8 * 1024;

pub enum Body {
    Buffer(Bytes),
    Receiver(Box<dyn ReceivingStream>),
    Sender(BodySender),
}

impl Body {
    pub fn empty() -> Self {
        Body::Buffer(Bytes::new())
    }

    pub fn receiver(stream: impl ReceivingStream + 'static) -> Self {
        Body::Receiver(Box::new(stream))
    }

    pub fn sender<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(BodySink) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StreamError>> + Send + 'static,
    {
        Body::Sender(BodySender::new(producer))
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self, Body::Buffer(_))
    }

    pub fn is_receiver(&self) -> bool {
        matches!(self, Body::Receiver(_))
    }

    pub fn is_sender(&self) -> bool {
        matches!(self, Body::Sender(_))
    }

    /// The buffered bytes, if this is a buffer.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Drains a streaming body into memory and turns it into a buffer.
    pub async fn become_buffer(&mut self, deadline: Deadline) -> Result<Bytes, BodyError> {
        let bytes = match self {
            Body::Buffer(bytes) => return Ok(bytes.clone()),
            Body::Receiver(stream) => drain(stream.as_mut(), deadline).await?,
            Body::Sender(sender) => {
                let mut stream = sender.take_stream()?;
                drain(&mut stream, deadline).await?
            }
        };

        *self = Body::Buffer(bytes.clone());
        Ok(bytes)
    }

    /// Turns the body into a receiver and returns it.
    pub fn become_receiver(&mut self) -> Result<&mut Box<dyn ReceivingStream>, BodyError> {
        match mem::take(self) {
            Body::Buffer(bytes) => *self = Body::receiver(MemoryStream::new(bytes)),
            Body::Sender(mut sender) => {
                let stream = sender.take_stream();
                // keep the consumed sender in place when the conversion fails
                *self = Body::Sender(sender);
                *self = Body::receiver(stream?);
            }
            receiver @ Body::Receiver(_) => *self = receiver,
        }

        match self {
            Body::Receiver(stream) => Ok(stream),
            _ => Err(BodyError::Consumed),
        }
    }

    /// Turns the body into a sender and returns it.
    pub fn become_sender(&mut self) -> &mut BodySender {
        let sender = match mem::take(self) {
            Body::Buffer(bytes) => BodySender::new(move |mut sink| async move {
                sink.send(&bytes, Deadline::never()).await
            }),
            Body::Receiver(mut stream) => BodySender::new(move |mut sink| async move {
                loop {
                    match stream.receive(DRAIN_CHUNK_SIZE, Deadline::never()).await {
                        Ok(bytes) => sink.send(&bytes, Deadline::never()).await?,
                        Err(StreamError::Closed) => return Ok(()),
                        Err(e) => return Err(e),
                    }
                }
            }),
            Body::Sender(sender) => sender,
        };

        *self = Body::Sender(sender);
        match self {
            Body::Sender(sender) => sender,
            // replaced just above
            Body::Buffer(_) | Body::Receiver(_) => unreachable!(),
        }
    }
}

async fn drain<R: ReceivingStream + ?Sized>(stream: &mut R, deadline: Deadline) -> Result<Bytes, BodyError> {
    let mut buffer = BytesMut::new();
    loop {
        match stream.receive(DRAIN_CHUNK_SIZE, deadline).await {
            Ok(bytes) => buffer.extend_from_slice(&bytes),
            Err(StreamError::Closed) => return Ok(buffer.freeze()),
            Err(e) => return Err(e.into()),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

/// Only buffers compare equal, streams never do.
impl PartialEq for Body {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Body::Buffer(a), Body::Buffer(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Buffer(bytes) => f.debug_tuple("Buffer").field(bytes).finish(),
            Body::Receiver(_) => f.write_str("Receiver(..)"),
            Body::Sender(sender) => f.debug_tuple("Sender").field(sender).finish(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Buffer(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Buffer(bytes.into())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Buffer(s.into())
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::Buffer(Bytes::from_static(s.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(s: &'static [u8]) -> Self {
        Body::Buffer(Bytes::from_static(s))
    }
}
