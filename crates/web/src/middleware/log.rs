use async_trait::async_trait;
use strand_http::protocol::{BoxError, Request, Response};
use tracing::{debug, info, warn};

use crate::middleware::Middleware;
use crate::responder::Responder;

/// Logs every exchange after the inner chain returns.
///
/// Errors are logged and passed on untouched. With `debug` set, request
/// and response headers are logged as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMiddleware {
    debug: bool,
}

impl LogMiddleware {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

#[async_trait]
impl Middleware for LogMiddleware {
    async fn respond(&self, request: Request, next: &dyn Responder) -> Result<Response, BoxError> {
        let method = request.method().clone();
        let uri = request.uri().to_string();
        let version = request.version();
        let request_headers = self.debug.then(|| request.headers().clone());

        let result = next.respond(request).await;

        match &result {
            Ok(response) => {
                info!(%method, %uri, ?version, status = response.status().as_u16(), "request handled");
                if let Some(request_headers) = request_headers {
                    debug!(?request_headers, response_headers = ?response.headers(), cookies = ?response.cookies(), body = ?response.body());
                }
            }
            Err(e) => warn!(%method, %uri, ?version, cause = %e, "request failed"),
        }
        result
    }
}
