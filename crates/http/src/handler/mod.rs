//! The seam between a connection and the application.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::protocol::{BoxError, Request, Response};

/// Turns a request into a response.
///
/// Errors that downcast to [`ClientError`](crate::protocol::ClientError) or
/// [`ServerError`](crate::protocol::ServerError) are answered with their
/// status; anything else becomes a `500 Internal Server Error`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, request: Request) -> Result<Response, BoxError>;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn call(&self, request: Request) -> Result<Response, BoxError> {
        (**self).call(request).await
    }
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Err: Into<BoxError>,
    Fut: Future<Output = Result<Response, Err>> + Send,
{
    async fn call(&self, request: Request) -> Result<Response, BoxError> {
        (self.f)(request).await.map_err(Into::into)
    }
}

pub fn make_handler<F, Err, Fut>(f: F) -> HandlerFn<F>
where
    Err: Into<BoxError>,
    Fut: Future<Output = Result<Response, Err>>,
    F: Fn(Request) -> Fut,
{
    HandlerFn { f }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::protocol::ClientError;

    #[tokio::test]
    async fn handler_from_fn() {
        let handler = make_handler(|request: Request| async move {
            if request.path() == "/missing" {
                return Err(ClientError::NotFound);
            }
            Ok(Response::with_body(StatusCode::OK, "found"))
        });

        let response = handler.call(Request::default()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder().uri(crate::protocol::Uri::parse("/missing").unwrap()).build();
        let error = handler.call(request).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ClientError>(), Some(&ClientError::NotFound));
    }
}
