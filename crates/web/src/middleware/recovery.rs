use std::fmt;

use async_trait::async_trait;
use strand_http::protocol::{BoxError, Request, Response, recover};

use crate::middleware::Middleware;
use crate::responder::Responder;

type Recover = dyn Fn(BoxError) -> Result<Response, BoxError> + Send + Sync;

/// Converts errors from the inner chain into responses.
///
/// By default [`ClientError`](strand_http::protocol::ClientError) and
/// [`ServerError`](strand_http::protocol::ServerError) become empty
/// responses with their status and anything else is raised again.
pub struct RecoveryMiddleware {
    recover: Box<Recover>,
}

impl RecoveryMiddleware {
    pub fn new() -> Self {
        Self::with(default_recover)
    }

    /// Recovers with `recover`; returning `Err` raises the error further.
    pub fn with<F>(recover: F) -> Self
    where
        F: Fn(BoxError) -> Result<Response, BoxError> + Send + Sync + 'static,
    {
        Self { recover: Box::new(recover) }
    }
}

impl Default for RecoveryMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecoveryMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryMiddleware").finish_non_exhaustive()
    }
}

fn default_recover(error: BoxError) -> Result<Response, BoxError> {
    recover(&error).ok_or(error)
}

#[async_trait]
impl Middleware for RecoveryMiddleware {
    async fn respond(&self, request: Request, next: &dyn Responder) -> Result<Response, BoxError> {
        match next.respond(request).await {
            Ok(response) => Ok(response),
            Err(e) => (self.recover)(e),
        }
    }
}
