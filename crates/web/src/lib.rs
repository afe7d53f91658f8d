//! Routing, middleware and a server on top of `strand-http`.
//!
//! Requests flow through a chain of [`Middleware`] into a [`Responder`],
//! usually a [`Router`] matching paths against a segment trie. Structured
//! bodies are decoded into [`Content`](content::Content) and encoded back by
//! [`ContentNegotiationMiddleware`](middleware::ContentNegotiationMiddleware).
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use serde_json::json;
//! use strand_http::protocol::{BoxError, Request, Response};
//! use strand_web::config::Configuration;
//! use strand_web::content::content_response;
//! use strand_web::responder::responder_fn;
//! use strand_web::router::Router;
//! use strand_web::server::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::builder()
//!         .configure(|routes| {
//!             routes.get(
//!                 "/hello/:name",
//!                 responder_fn(|request: Request| async move {
//!                     let name: String = request.path_parameter("name")?;
//!                     Ok::<_, BoxError>(content_response(StatusCode::OK, &json!({"hello": name}))?)
//!                 }),
//!             );
//!         })
//!         .build();
//!
//!     let server = Server::from_configuration(&Configuration::new(), Vec::new(), router).unwrap();
//!     server.start().await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! - [`responder`] / [`middleware`]: the request pipeline
//! - [`router`]: route collection and trie matching
//! - [`content`] / [`media_type`]: structured bodies
//! - [`config`] / [`server`]: settings and the accept loop

pub mod config;
pub mod content;
pub mod media_type;
pub mod middleware;
pub mod responder;
pub mod router;
pub mod server;

pub use middleware::Middleware;
pub use responder::{Responder, responder_fn};
pub use router::{Router, Routes};
pub use server::Server;
