//! Path routing over a segment trie.
//!
//! Routes are collected with [`Routes`] and frozen into a [`Router`]. A router
//! runs its own middleware, then matches the request path with a
//! [`TrieRouteMatcher`] and hands the request to the action registered for
//! its method.
//!
//! ```no_run
//! use http::StatusCode;
//! use strand_http::protocol::{BoxError, Request, Response};
//! use strand_web::responder::responder_fn;
//! use strand_web::router::Router;
//!
//! let router = Router::builder()
//!     .configure(|routes| {
//!         routes.get(
//!             "/users/:id",
//!             responder_fn(|request: Request| async move {
//!                 let id: u64 = request.path_parameter("id")?;
//!                 Ok::<_, BoxError>(Response::with_body(StatusCode::OK, format!("user {id}")))
//!             }),
//!         );
//!     })
//!     .build();
//! # let _ = router;
//! ```

mod matcher;
mod route;
mod routes;
pub mod trie;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use strand_http::protocol::{BoxError, Request, Response};

use crate::middleware::{Middleware, chain};
use crate::responder::Responder;

pub use matcher::{Segment, TrieRouteMatcher};
pub use route::Route;
pub use routes::Routes;

pub struct Router {
    matcher: Arc<TrieRouteMatcher>,
    entry: Arc<dyn Responder>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// A router without middleware of its own.
    pub fn new(routes: Routes) -> Self {
        Self::builder().routes(routes).build()
    }

    pub fn routes(&self) -> &[Route] {
        self.matcher.routes()
    }

    pub fn matcher(&self) -> &TrieRouteMatcher {
        &self.matcher
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.routes()).finish_non_exhaustive()
    }
}

#[async_trait]
impl Responder for Router {
    async fn respond(&self, request: Request) -> Result<Response, BoxError> {
        self.entry.respond(request).await
    }
}

/// Matches the request and calls the route, or the global fallback.
struct Dispatch {
    matcher: Arc<TrieRouteMatcher>,
    fallback: Arc<dyn Responder>,
}

#[async_trait]
impl Responder for Dispatch {
    async fn respond(&self, mut request: Request) -> Result<Response, BoxError> {
        match self.matcher.match_route(&mut request) {
            Some(responder) => responder.respond(request).await,
            None => self.fallback.respond(request).await,
        }
    }
}

pub struct RouterBuilder {
    middleware: Vec<Arc<dyn Middleware>>,
    routes: Routes,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { middleware: Vec::new(), routes: Routes::new() }
    }

    /// Appends middleware; the first one added sees the request first.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = routes;
        self
    }

    pub fn configure<F: FnOnce(&mut Routes)>(mut self, configure: F) -> Self {
        configure(&mut self.routes);
        self
    }

    pub fn build(self) -> Router {
        let (routes, fallback) = self.routes.into_parts();
        let matcher = Arc::new(TrieRouteMatcher::new(routes));
        let dispatch = Dispatch { matcher: Arc::clone(&matcher), fallback };
        Router { matcher, entry: chain(self.middleware, Arc::new(dispatch)) }
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use strand_http::protocol::{ClientError, Uri};

    use super::*;
    use crate::middleware::RecoveryMiddleware;
    use crate::responder::responder_fn;

    #[tokio::test]
    async fn router_middleware_wraps_the_fallback() {
        let router = Router::builder()
            .middleware(RecoveryMiddleware::new())
            .configure(|routes| {
                routes.get(
                    "/hello/:name",
                    responder_fn(|request: Request| async move {
                        let name: String = request.path_parameter("name")?;
                        Ok::<_, BoxError>(Response::with_body(StatusCode::OK, format!("hello {name}")))
                    }),
                );
            })
            .build();

        let response = router.respond(Request::new(Method::GET, Uri::parse("/hello/venice").unwrap())).await.unwrap();
        assert_eq!(response.bytes().map(|b| &b[..]), Some(&b"hello venice"[..]));

        let response = router.respond(Request::new(Method::GET, Uri::parse("/bye").unwrap())).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router.respond(Request::new(Method::POST, Uri::parse("/hello/venice").unwrap())).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn without_recovery_errors_surface() {
        let router = Router::new(Routes::new());
        let error = router.respond(Request::default()).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ClientError>(), Some(&ClientError::NotFound));
    }
}
