//! Per-connection request processing.
//!
//! # Components
//!
//! - [`HttpConnection`]: owns one stream and runs parse, handle and
//!   serialize in sequence until the connection ends
//!
//! Requests on a connection are handled strictly one after another.

mod http_connection;

pub use http_connection::HttpConnection;
