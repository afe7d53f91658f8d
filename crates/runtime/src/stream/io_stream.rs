use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::{Closable, ReceivingStream, SendingStream, StreamError};
use crate::Deadline;

/// A [`Stream`](super::Stream) over a tokio transport.
#[derive(Debug)]
pub struct IoStream<T> {
    io: T,
    closed: bool,
}

impl<T> IoStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(io: T) -> Self {
        Self { io, closed: false }
    }

    pub fn get_ref(&self) -> &T {
        &self.io
    }

    pub fn into_inner(self) -> T {
        self.io
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.closed { Err(StreamError::Closed) } else { Ok(()) }
    }
}

#[async_trait]
impl<T> Closable for IoStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn close(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.closed = true;
        match self.io.shutdown().await {
            Ok(()) => Ok(()),
            // the peer may already be gone, the stream is closed either way
            Err(e) => {
                trace!(cause = %e, "shutdown failed while closing stream");
                Ok(())
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl<T> ReceivingStream for IoStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self, up_to: usize, deadline: Deadline) -> Result<Bytes, StreamError> {
        self.ensure_open()?;

        let mut buf = BytesMut::zeroed(up_to.max(1));
        let read = deadline.run(self.io.read(&mut buf)).await.map_err(|_elapsed| StreamError::Timeout)??;
        if read == 0 {
            self.closed = true;
            return Err(StreamError::Closed);
        }

        buf.truncate(read);
        Ok(buf.freeze())
    }
}

#[async_trait]
impl<T> SendingStream for IoStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, bytes: &[u8], deadline: Deadline) -> Result<(), StreamError> {
        self.ensure_open()?;
        deadline.run(self.io.write_all(bytes)).await.map_err(|_elapsed| StreamError::Timeout)??;
        Ok(())
    }

    async fn flush(&mut self, deadline: Deadline) -> Result<(), StreamError> {
        self.ensure_open()?;
        deadline.run(self.io.flush()).await.map_err(|_elapsed| StreamError::Timeout)??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn receive_and_send_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut client = IoStream::new(client);
        let mut server = IoStream::new(server);

        client.send(b"ping", Deadline::never()).await.unwrap();
        client.flush(Deadline::never()).await.unwrap();
        assert_eq!(server.receive(2, Deadline::never()).await.unwrap(), Bytes::from_static(b"pi"));
        assert_eq!(server.receive(16, Deadline::never()).await.unwrap(), Bytes::from_static(b"ng"));

        client.close().await.unwrap();
        assert!(matches!(server.receive(16, Deadline::never()).await, Err(StreamError::Closed)));
        assert!(server.is_closed());
    }

    #[tokio::test]
    async fn receive_times_out() {
        let (_client, server) = tokio::io::duplex(64);
        let mut server = IoStream::new(server);

        let result = server.receive(16, Deadline::after(Duration::from_millis(10))).await;
        assert!(matches!(result, Err(StreamError::Timeout)));
        assert!(!server.is_closed());
    }

    #[tokio::test]
    async fn double_close_fails() {
        let (_client, server) = tokio::io::duplex(64);
        let mut server = IoStream::new(server);

        server.close().await.unwrap();
        assert!(matches!(server.close().await, Err(StreamError::Closed)));
        assert!(matches!(server.send(b"late", Deadline::never()).await, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn send_to_dropped_peer_is_broken_pipe() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        let mut server = IoStream::new(server);

        let result = server.send(b"anyone?", Deadline::never()).await;
        assert!(matches!(result, Err(StreamError::BrokenPipe)));
    }
}
