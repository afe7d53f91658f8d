use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde::de::DeserializeOwned;
use strand_http::protocol::{BoxError, ClientError, Request, Response};
use tracing::{debug, warn};

use crate::middleware::{ContentMapperMiddleware, Middleware, chain};
use crate::responder::{Reject, Responder};
use crate::router::Router;
use crate::router::matcher::{parameter_names, same_pattern, split_path};
use crate::router::route::Route;

/// Collects routes before a [`Router`] is built.
///
/// Paths are compared by the requests they match: `/users` and `/users/`
/// are one route, and so are `/users/:id` and `/users/:uid`. Registering a
/// second method on a known path adds an action to the existing route; the
/// action still sees its parameters under the names it was registered
/// with. Registering a known method again replaces its action and logs a
/// warning.
pub struct Routes {
    routes: Vec<Route>,
    fallback: Arc<dyn Responder>,
}

macro_rules! method_route {
    ($name:ident, $method:expr) => {
        #[doc = concat!("Registers `responder` for `", stringify!($name), "` requests to `path`.")]
        pub fn $name<R: Responder + 'static>(&mut self, path: &str, responder: R) -> &mut Self {
            self.add($method, path, Vec::new(), responder)
        }
    };
}

impl Routes {
    /// No routes, and a fallback failing with `404 Not Found`.
    pub fn new() -> Self {
        Self { routes: Vec::new(), fallback: Arc::new(Reject(ClientError::NotFound)) }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn add<R: Responder + 'static>(
        &mut self,
        method: Method,
        path: &str,
        middleware: Vec<Arc<dyn Middleware>>,
        responder: R,
    ) -> &mut Self {
        let action = chain(middleware, Arc::new(responder));
        match self.route_mut(path) {
            Some(route) => {
                let renames: Vec<(String, String)> =
                    parameter_names(route.path()).zip(parameter_names(path)).filter(|(from, to)| from != to).collect();
                let action: Arc<dyn Responder> = if renames.is_empty() {
                    action
                } else {
                    debug!(%method, path, route = route.path(), "renaming path parameters for action");
                    Arc::new(RenameParameters { renames, responder: action })
                };
                if route.add_action(method.clone(), action).is_some() {
                    warn!(%method, path, "route registered twice, replacing the earlier action");
                }
            }
            None => {
                let mut route = Route::new(path);
                route.add_action(method, action);
                self.routes.push(route);
            }
        }
        self
    }

    method_route!(get, Method::GET);
    method_route!(head, Method::HEAD);
    method_route!(post, Method::POST);
    method_route!(put, Method::PUT);
    method_route!(patch, Method::PATCH);
    method_route!(delete, Method::DELETE);
    method_route!(options, Method::OPTIONS);

    /// Registers `respond` with the request content decoded into a `T`.
    ///
    /// A request without content, or with content that does not decode, is
    /// answered with [`ClientError::BadRequest`] before `respond` runs.
    pub fn add_content<T, F, Fut, Err>(
        &mut self,
        method: Method,
        path: &str,
        middleware: Vec<Arc<dyn Middleware>>,
        respond: F,
    ) -> &mut Self
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
        F: Fn(Request, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Err>> + Send,
        Err: Into<BoxError>,
    {
        let mut all: Vec<Arc<dyn Middleware>> = vec![Arc::new(ContentMapperMiddleware::<T>::new())];
        all.extend(middleware);
        self.add(method, path, all, ContentResponder { respond, _content: PhantomData })
    }

    /// Answers requests no route matches.
    pub fn fallback<R: Responder + 'static>(&mut self, middleware: Vec<Arc<dyn Middleware>>, responder: R) -> &mut Self {
        self.fallback = chain(middleware, Arc::new(responder));
        self
    }

    /// Answers requests to `path` whose method has no action.
    pub fn route_fallback<R: Responder + 'static>(
        &mut self,
        path: &str,
        middleware: Vec<Arc<dyn Middleware>>,
        responder: R,
    ) -> &mut Self {
        let fallback = chain(middleware, Arc::new(responder));
        match self.route_mut(path) {
            Some(route) => route.set_fallback(fallback),
            None => {
                let mut route = Route::new(path);
                route.set_fallback(fallback);
                self.routes.push(route);
            }
        }
        self
    }

    /// Mounts every route of `router` below `prefix`.
    ///
    /// Mounted requests reach `router` with the prefix segments stripped
    /// from their path, so the router matches them against its own patterns
    /// and runs its own middleware.
    pub fn compose(&mut self, prefix: &str, middleware: Vec<Arc<dyn Middleware>>, router: Router) -> &mut Self {
        let mount = Mount { depth: split_path(prefix).count(), router: Arc::new(router) };
        let mounted: Vec<(String, Method)> = mount
            .router
            .routes()
            .iter()
            .flat_map(|route| route.methods().map(|method| (format!("{prefix}{}", route.path()), method.clone())))
            .collect();

        for (path, method) in mounted {
            self.add(method, &path, middleware.clone(), mount.clone());
        }
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<Route>, Arc<dyn Responder>) {
        (self.routes, self.fallback)
    }

    fn route_mut(&mut self, path: &str) -> Option<&mut Route> {
        self.routes.iter_mut().find(|route| same_pattern(route.path(), path))
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routes").field("routes", &self.routes).finish_non_exhaustive()
    }
}

struct ContentResponder<T, F> {
    respond: F,
    _content: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T, F, Fut, Err> Responder for ContentResponder<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(Request, T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Err>> + Send,
    Err: Into<BoxError>,
{
    async fn respond(&self, mut request: Request) -> Result<Response, BoxError> {
        let content = request.storage_mut().remove::<T>().ok_or(ClientError::BadRequest)?;
        (self.respond)(request, content).await.map_err(Into::into)
    }
}

/// Moves parameters captured under the route's names to the action's names.
struct RenameParameters {
    renames: Vec<(String, String)>,
    responder: Arc<dyn Responder>,
}

#[async_trait]
impl Responder for RenameParameters {
    async fn respond(&self, mut request: Request) -> Result<Response, BoxError> {
        let parameters = request.path_parameters_mut();
        let moved: Vec<(&str, Option<String>)> =
            self.renames.iter().map(|(from, to)| (to.as_str(), parameters.remove(from))).collect();
        for (to, value) in moved {
            if let Some(value) = value {
                parameters.insert(to, value);
            }
        }
        self.responder.respond(request).await
    }
}

/// Strips the mount prefix and hands the request to the mounted router.
#[derive(Clone)]
struct Mount {
    depth: usize,
    router: Arc<Router>,
}

#[async_trait]
impl Responder for Mount {
    async fn respond(&self, mut request: Request) -> Result<Response, BoxError> {
        let path = format!("/{}", split_path(request.path()).skip(self.depth).collect::<Vec<_>>().join("/"));
        debug!(from = request.path(), to = %path, "entering mounted router");
        request.uri_mut().set_path(&path)?;
        self.router.respond(request).await
    }
}
