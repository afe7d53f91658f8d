//! Anything that turns a [`Request`] into a [`Response`].
//!
//! Route actions, fallbacks, routers and middleware chains are all
//! [`Responder`]s. Plain async functions become one through [`responder_fn`].

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use strand_http::protocol::{BoxError, ClientError, Request, Response};

/// Responds to a request, or fails with an error the recovery layers map
/// to a status.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, request: Request) -> Result<Response, BoxError>;
}

#[async_trait]
impl<R: Responder + ?Sized> Responder for Arc<R> {
    async fn respond(&self, request: Request) -> Result<Response, BoxError> {
        (**self).respond(request).await
    }
}

#[async_trait]
impl<R: Responder + ?Sized> Responder for Box<R> {
    async fn respond(&self, request: Request) -> Result<Response, BoxError> {
        (**self).respond(request).await
    }
}

/// An async `Fn(Request) -> Result<Response, E>` as a [`Responder`].
#[derive(Debug)]
pub struct ResponderFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Responder for ResponderFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Err: Into<BoxError>,
    Fut: Future<Output = Result<Response, Err>> + Send,
{
    async fn respond(&self, request: Request) -> Result<Response, BoxError> {
        (self.f)(request).await.map_err(Into::into)
    }
}

pub fn responder_fn<F, Err, Fut>(f: F) -> ResponderFn<F>
where
    Err: Into<BoxError>,
    Fut: Future<Output = Result<Response, Err>>,
    F: Fn(Request) -> Fut,
{
    ResponderFn { f }
}

/// Always fails with the same client error.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reject(pub(crate) ClientError);

#[async_trait]
impl Responder for Reject {
    async fn respond(&self, _request: Request) -> Result<Response, BoxError> {
        Err(self.0.into())
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    #[tokio::test]
    async fn fn_responder() {
        let responder = responder_fn(|request: Request| async move {
            Ok::<_, ClientError>(Response::with_body(StatusCode::OK, request.path().to_string()))
        });

        let response = responder.respond(Request::default()).await.unwrap();
        assert_eq!(response.bytes().map(|b| &b[..]), Some(&b"/"[..]));
    }

    #[tokio::test]
    async fn shared_responders() {
        let responder: Arc<dyn Responder> = Arc::new(Reject(ClientError::NotFound));
        let error = responder.respond(Request::default()).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ClientError>(), Some(&ClientError::NotFound));

        let boxed: Box<dyn Responder> = Box::new(Reject(ClientError::Gone));
        let error = boxed.respond(Request::default()).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ClientError>(), Some(&ClientError::Gone));
    }
}
