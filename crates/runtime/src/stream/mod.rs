//! Byte streams and hosts accepting them.
//!
//! # Components
//!
//! - [`ReceivingStream`] / [`SendingStream`] / [`Stream`]: deadline-aware byte I/O
//! - [`Host`]: a listening endpoint producing streams
//! - [`IoStream`]: adapts any tokio `AsyncRead + AsyncWrite` transport
//! - [`TcpHost`]: TCP listener
//! - [`memory_host`] and [`MemoryStream`]: in-process transports, mainly for tests

mod io_stream;
mod memory;
mod tcp;

pub use io_stream::IoStream;
pub use memory::{MemoryConnector, MemoryHost, MemoryStream, memory_host};
pub use tcp::{TcpHost, TcpStream};

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::Deadline;

#[derive(Debug, Error)]
pub enum StreamError {
    /// The stream was closed, locally or by the peer.
    #[error("stream is closed")]
    Closed,

    #[error("stream operation timed out")]
    Timeout,

    /// The peer went away while data was being written.
    #[error("broken pipe")]
    BrokenPipe,

    #[error("io error: {source}")]
    Io { source: io::Error },
}

impl From<io::Error> for StreamError {
    fn from(source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                StreamError::BrokenPipe
            }
            io::ErrorKind::TimedOut => StreamError::Timeout,
            _ => StreamError::Io { source },
        }
    }
}

impl StreamError {
    /// Whether the peer is gone, in which case nothing more can be sent.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, StreamError::Closed | StreamError::BrokenPipe)
    }
}

#[async_trait]
pub trait Closable: Send {
    /// Closes the stream. Closing twice fails with [`StreamError::Closed`].
    async fn close(&mut self) -> Result<(), StreamError>;

    fn is_closed(&self) -> bool;
}

#[async_trait]
pub trait ReceivingStream: Closable {
    /// Receives at most `up_to` bytes, waiting until at least one is available.
    ///
    /// End of stream is reported as [`StreamError::Closed`], never as an empty chunk.
    async fn receive(&mut self, up_to: usize, deadline: Deadline) -> Result<Bytes, StreamError>;
}

#[async_trait]
pub trait SendingStream: Closable {
    async fn send(&mut self, bytes: &[u8], deadline: Deadline) -> Result<(), StreamError>;

    async fn flush(&mut self, deadline: Deadline) -> Result<(), StreamError>;
}

/// A bidirectional byte stream.
pub trait Stream: ReceivingStream + SendingStream {}

impl<T: ReceivingStream + SendingStream + ?Sized> Stream for T {}

/// Accepts incoming streams.
#[async_trait]
pub trait Host: Send + Sync {
    type Stream: Stream + 'static;

    async fn accept(&self, deadline: Deadline) -> Result<Self::Stream, StreamError>;
}

#[async_trait]
impl<C: Closable + ?Sized> Closable for Box<C> {
    async fn close(&mut self) -> Result<(), StreamError> {
        (**self).close().await
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

#[async_trait]
impl<R: ReceivingStream + ?Sized> ReceivingStream for Box<R> {
    async fn receive(&mut self, up_to: usize, deadline: Deadline) -> Result<Bytes, StreamError> {
        (**self).receive(up_to, deadline).await
    }
}

#[async_trait]
impl<S: SendingStream + ?Sized> SendingStream for Box<S> {
    async fn send(&mut self, bytes: &[u8], deadline: Deadline) -> Result<(), StreamError> {
        (**self).send(bytes, deadline).await
    }

    async fn flush(&mut self, deadline: Deadline) -> Result<(), StreamError> {
        (**self).flush(deadline).await
    }
}

#[async_trait]
impl<C: Closable + ?Sized> Closable for &mut C {
    async fn close(&mut self) -> Result<(), StreamError> {
        (**self).close().await
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

#[async_trait]
impl<R: ReceivingStream + ?Sized> ReceivingStream for &mut R {
    async fn receive(&mut self, up_to: usize, deadline: Deadline) -> Result<Bytes, StreamError> {
        (**self).receive(up_to, deadline).await
    }
}

#[async_trait]
impl<S: SendingStream + ?Sized> SendingStream for &mut S {
    async fn send(&mut self, bytes: &[u8], deadline: Deadline) -> Result<(), StreamError> {
        (**self).send(bytes, deadline).await
    }

    async fn flush(&mut self, deadline: Deadline) -> Result<(), StreamError> {
        (**self).flush(deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_io_errors() {
        let broken = StreamError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(matches!(broken, StreamError::BrokenPipe));

        let reset = StreamError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(reset.is_disconnect());

        let timeout = StreamError::from(io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(timeout, StreamError::Timeout));

        let other = StreamError::from(io::Error::other("disk on fire"));
        assert!(matches!(other, StreamError::Io { .. }));
        assert!(!other.is_disconnect());
    }
}
