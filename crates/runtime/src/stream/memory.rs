use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::DuplexStream;

use super::{Closable, Host, IoStream, ReceivingStream, SendingStream, StreamError};
use crate::Deadline;
use crate::channel::{Channel, ChannelError, SendError};

const DUPLEX_BUFFER_SIZE: usize = 64 * 1024;

/// Creates a connected in-process host and connector pair.
pub fn memory_host() -> (MemoryHost, MemoryConnector) {
    let incoming = Channel::new();
    (MemoryHost { incoming: incoming.clone() }, MemoryConnector { incoming })
}

/// The accepting side of an in-process transport.
#[derive(Debug)]
pub struct MemoryHost {
    incoming: Channel<IoStream<DuplexStream>>,
}

impl MemoryHost {
    /// Stops accepting; pending and future `accept` calls fail with [`StreamError::Closed`].
    pub fn close(&self) {
        self.incoming.close();
    }
}

#[async_trait]
impl Host for MemoryHost {
    type Stream = IoStream<DuplexStream>;

    async fn accept(&self, deadline: Deadline) -> Result<Self::Stream, StreamError> {
        self.incoming.receive(deadline).await.map_err(|e| match e {
            ChannelError::Closed => StreamError::Closed,
            ChannelError::Timeout => StreamError::Timeout,
        })
    }
}

/// Opens connections to a [`MemoryHost`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    incoming: Channel<IoStream<DuplexStream>>,
}

impl MemoryConnector {
    /// Connects to the host, waiting until it accepts or `deadline` passes.
    pub async fn connect(&self, deadline: Deadline) -> Result<IoStream<DuplexStream>, StreamError> {
        let (client, server) = tokio::io::duplex(DUPLEX_BUFFER_SIZE);
        match self.incoming.send(IoStream::new(server), deadline).await {
            Ok(()) => Ok(IoStream::new(client)),
            Err(SendError::Closed(_)) => Err(StreamError::Closed),
            Err(SendError::Timeout(_)) => Err(StreamError::Timeout),
        }
    }
}

/// A stream reading from a fixed input and collecting what is sent.
///
/// Reading past the end of the input reports [`StreamError::Closed`].
#[derive(Debug, Default)]
pub struct MemoryStream {
    input: Bytes,
    output: BytesMut,
    closed: bool,
}

impl MemoryStream {
    pub fn new(input: impl Into<Bytes>) -> Self {
        Self { input: input.into(), output: BytesMut::new(), closed: false }
    }

    /// Everything sent so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn into_output(self) -> Bytes {
        self.output.freeze()
    }

    /// Input that has not been received yet.
    pub fn remaining(&self) -> &[u8] {
        &self.input
    }
}

#[async_trait]
impl Closable for MemoryStream {
    async fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl ReceivingStream for MemoryStream {
    async fn receive(&mut self, up_to: usize, _deadline: Deadline) -> Result<Bytes, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }

        if !self.input.has_remaining() {
            self.closed = true;
            return Err(StreamError::Closed);
        }

        let size = up_to.max(1).min(self.input.len());
        Ok(self.input.split_to(size))
    }
}

#[async_trait]
impl SendingStream for MemoryStream {
    async fn send(&mut self, bytes: &[u8], _deadline: Deadline) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    async fn flush(&mut self, _deadline: Deadline) -> Result<(), StreamError> {
        if self.closed { Err(StreamError::Closed) } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn;

    #[tokio::test]
    async fn scripted_stream() {
        let mut stream = MemoryStream::new("abcdef");
        assert_eq!(stream.receive(4, Deadline::never()).await.unwrap(), Bytes::from_static(b"abcd"));
        assert_eq!(stream.receive(4, Deadline::never()).await.unwrap(), Bytes::from_static(b"ef"));
        assert!(matches!(stream.receive(4, Deadline::never()).await, Err(StreamError::Closed)));
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn collects_output() {
        let mut stream = MemoryStream::default();
        stream.send(b"hello ", Deadline::never()).await.unwrap();
        stream.send(b"world", Deadline::never()).await.unwrap();
        assert_eq!(stream.output(), b"hello world");
    }

    #[tokio::test]
    async fn connect_to_memory_host() {
        let (host, connector) = memory_host();

        let server = spawn(async move {
            let mut stream = host.accept(Deadline::never()).await.unwrap();
            let bytes = stream.receive(16, Deadline::never()).await.unwrap();
            stream.send(&bytes, Deadline::never()).await.unwrap();
            host.close();
            host.accept(Deadline::never()).await.is_err()
        });

        let mut client = connector.connect(Deadline::never()).await.unwrap();
        client.send(b"echo", Deadline::never()).await.unwrap();
        assert_eq!(client.receive(16, Deadline::never()).await.unwrap(), Bytes::from_static(b"echo"));
        assert!(server.join().await.unwrap());
        assert!(matches!(connector.connect(Deadline::never()).await, Err(StreamError::Closed)));
    }
}
