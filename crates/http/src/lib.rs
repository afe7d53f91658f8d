//! HTTP/1.x for the strand runtime.
//!
//! Messages are read from and written to any [`Stream`](strand_runtime::stream::Stream):
//! a parser turns incoming bytes into [`Request`](protocol::Request)s regardless of how
//! the bytes are split across reads, a serializer writes
//! [`Response`](protocol::Response)s with `Content-Length` or chunked framing, and
//! [`HttpConnection`](connection::HttpConnection) ties both to a [`Handler`](handler::Handler).
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use strand_http::connection::HttpConnection;
//! use strand_http::handler::make_handler;
//! use strand_http::protocol::{BoxError, Request, Response};
//! use strand_runtime::Deadline;
//! use strand_runtime::stream::{Host, TcpHost};
//! use tracing::{error, info};
//!
//! #[tokio::main]
//! async fn main() {
//!     let host = match TcpHost::bind("127.0.0.1", 8080, false).await {
//!         Ok(host) => host,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = std::sync::Arc::new(make_handler(hello_world));
//!     loop {
//!         let Ok(stream) = host.accept(Deadline::never()).await else { continue };
//!         let handler = handler.clone();
//!         strand_runtime::spawn(async move {
//!             if let Err(e) = HttpConnection::new(stream).process(&*handler).await {
//!                 error!(cause = %e, "connection failed");
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request) -> Result<Response, BoxError> {
//!     info!(path = request.path(), "request");
//!     Ok(Response::with_body(StatusCode::OK, "Hello World!\r\n"))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: messages, bodies, cookies, URIs and errors
//! - [`codec`]: `tokio_util` decoders and encoders for heads and bodies
//! - [`parser`] / [`serializer`]: the codecs driven over a stream
//! - [`connection`]: the keep-alive loop
//! - [`handler`]: the application seam
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only
//! - At most 64 headers in at most 8 KiB per head

pub mod codec;
pub mod connection;
pub mod handler;
pub mod parser;
pub mod protocol;
pub mod serializer;

mod utils;
