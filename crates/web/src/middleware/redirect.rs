use std::fmt;

use async_trait::async_trait;
use http::header::{InvalidHeaderValue, LOCATION};
use http::{HeaderValue, StatusCode};
use strand_http::protocol::{BoxError, Request, Response};

use crate::middleware::Middleware;
use crate::responder::Responder;

type Predicate = dyn Fn(&Request) -> bool + Send + Sync;

/// Answers requests matching a predicate with `302 Found` instead of
/// calling the inner chain.
pub struct RedirectMiddleware {
    location: HeaderValue,
    predicate: Box<Predicate>,
}

impl RedirectMiddleware {
    pub fn new<F>(location: &str, predicate: F) -> Result<Self, InvalidHeaderValue>
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Ok(Self { location: HeaderValue::from_str(location)?, predicate: Box::new(predicate) })
    }
}

impl fmt::Debug for RedirectMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectMiddleware").field("location", &self.location).finish_non_exhaustive()
    }
}

#[async_trait]
impl Middleware for RedirectMiddleware {
    async fn respond(&self, request: Request, next: &dyn Responder) -> Result<Response, BoxError> {
        if (self.predicate)(&request) {
            return Ok(Response::builder().status(StatusCode::FOUND).header(LOCATION, self.location.clone()).build());
        }
        next.respond(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::Method;
    use strand_http::protocol::Uri;

    use super::*;
    use crate::middleware::chain;
    use crate::responder::responder_fn;

    fn redirect_gets() -> Arc<dyn Responder> {
        let middleware = RedirectMiddleware::new("/over-there", |request| request.method() == Method::GET).unwrap();
        chain(
            vec![Arc::new(middleware)],
            Arc::new(responder_fn(|request: Request| async move {
                assert_ne!(request.method(), Method::GET, "should have redirected");
                Ok::<_, BoxError>(Response::new(StatusCode::OK))
            })),
        )
    }

    #[tokio::test]
    async fn does_redirect() {
        let response = redirect_gets().respond(Request::new(Method::GET, Uri::default())).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/over-there");
    }

    #[tokio::test]
    async fn does_not_redirect() {
        let response = redirect_gets().respond(Request::new(Method::POST, Uri::default())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(LOCATION).is_none());
    }

    #[test]
    fn rejects_invalid_locations() {
        assert!(RedirectMiddleware::new("/bad\nplace", |_| true).is_err());
    }
}
