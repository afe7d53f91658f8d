//! Responder wrappers and their composition.
//!
//! A [`Middleware`] sees the request before the responder it wraps and the
//! result after it. [`chain`] nests a list of middleware around a responder,
//! the first element outermost.
//!
//! # Components
//!
//! - [`LogMiddleware`]: logs each exchange once the inner chain returns
//! - [`RecoveryMiddleware`]: turns status errors into responses
//! - [`ContentNegotiationMiddleware`]: decodes request bodies and encodes
//!   response [`Content`](crate::content::Content) by media type
//! - [`ContentMapperMiddleware`]: maps decoded content onto a typed value
//! - [`RedirectMiddleware`]: answers matching requests with a redirect

use std::sync::Arc;

use async_trait::async_trait;
use strand_http::protocol::{BoxError, Request, Response};

use crate::responder::Responder;

mod content_mapper;
mod content_negotiation;
mod log;
mod recovery;
mod redirect;

pub use content_mapper::ContentMapperMiddleware;
pub use content_negotiation::ContentNegotiationMiddleware;
pub use log::LogMiddleware;
pub use recovery::RecoveryMiddleware;
pub use redirect::RedirectMiddleware;

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn respond(&self, request: Request, next: &dyn Responder) -> Result<Response, BoxError>;
}

#[async_trait]
impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    async fn respond(&self, request: Request, next: &dyn Responder) -> Result<Response, BoxError> {
        (**self).respond(request, next).await
    }
}

/// Wraps `responder` so that `middleware[0]` runs first and sees the response last.
pub fn chain(middleware: Vec<Arc<dyn Middleware>>, responder: Arc<dyn Responder>) -> Arc<dyn Responder> {
    middleware.into_iter().rev().fold(responder, |next, middleware| Arc::new(Chained { middleware, next }))
}

struct Chained {
    middleware: Arc<dyn Middleware>,
    next: Arc<dyn Responder>,
}

#[async_trait]
impl Responder for Chained {
    async fn respond(&self, request: Request) -> Result<Response, BoxError> {
        self.middleware.respond(request, self.next.as_ref()).await
    }
}
