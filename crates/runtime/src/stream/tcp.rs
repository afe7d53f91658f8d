use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpSocket, lookup_host};
use tracing::{debug, info};

use super::{Host, IoStream, StreamError};
use crate::Deadline;

pub type TcpStream = IoStream<tokio::net::TcpStream>;

/// A listening TCP socket.
#[derive(Debug)]
pub struct TcpHost {
    listener: TcpListener,
}

impl TcpHost {
    /// Binds to `host:port`; port 0 picks a free port.
    ///
    /// With `reuse_port`, several hosts may bind the same address on
    /// platforms that support `SO_REUSEPORT`.
    pub async fn bind(host: &str, port: u16, reuse_port: bool) -> io::Result<Self> {
        let address = lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, format!("cannot resolve {host}")))?;

        let socket = if address.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
        socket.set_reuseaddr(true)?;
        #[cfg(unix)]
        if reuse_port {
            socket.set_reuseport(true)?;
        }
        #[cfg(not(unix))]
        let _ = reuse_port;

        socket.bind(address)?;
        let listener = socket.listen(1024)?;
        info!(address = %listener.local_addr()?, "tcp host bound");
        Ok(Self { listener })
    }

    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listener }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

#[async_trait]
impl Host for TcpHost {
    type Stream = TcpStream;

    async fn accept(&self, deadline: Deadline) -> Result<Self::Stream, StreamError> {
        let (stream, peer) = deadline.run(self.listener.accept()).await.map_err(|_elapsed| StreamError::Timeout)??;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted tcp connection");
        Ok(IoStream::new(stream))
    }
}
