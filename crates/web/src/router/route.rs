use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use strand_http::protocol::ClientError;

use crate::responder::{Reject, Responder};

/// A path pattern with one action per method and a fallback for other methods.
///
/// Patterns are `/`-separated literal segments, `:name` captures and a
/// trailing `*` matching any remaining segments.
#[derive(Clone)]
pub struct Route {
    path: String,
    actions: HashMap<Method, Arc<dyn Responder>>,
    fallback: Arc<dyn Responder>,
}

impl Route {
    /// A route without actions; every method falls back to `405 Method Not Allowed`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), actions: HashMap::new(), fallback: Arc::new(Reject(ClientError::MethodNotAllowed)) }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.actions.keys()
    }

    pub fn action(&self, method: &Method) -> Option<&Arc<dyn Responder>> {
        self.actions.get(method)
    }

    pub fn fallback(&self) -> &Arc<dyn Responder> {
        &self.fallback
    }

    /// The action for `method`, or the fallback.
    pub fn responder(&self, method: &Method) -> Arc<dyn Responder> {
        Arc::clone(self.actions.get(method).unwrap_or(&self.fallback))
    }

    /// Registers `action` for `method`, returning the action it replaces.
    pub fn add_action(&mut self, method: Method, action: Arc<dyn Responder>) -> Option<Arc<dyn Responder>> {
        self.actions.insert(method, action)
    }

    pub fn set_fallback(&mut self, fallback: Arc<dyn Responder>) {
        self.fallback = fallback;
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.actions.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("Route").field("path", &self.path).field("methods", &methods).finish_non_exhaustive()
    }
}
