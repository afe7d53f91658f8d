use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use strand_http::protocol::{BoxError, ClientError, Request, Response};
use tracing::debug;

use crate::content::ContentExt;
use crate::middleware::Middleware;
use crate::responder::Responder;

/// Decodes the request [`Content`](crate::content::Content) into a `T`
/// stored in the request storage.
///
/// Fails with [`ClientError::BadRequest`] when the request has no content
/// or the content does not decode.
pub struct ContentMapperMiddleware<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> ContentMapperMiddleware<T> {
    pub fn new() -> Self {
        Self { _target: PhantomData }
    }
}

impl<T> Default for ContentMapperMiddleware<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ContentMapperMiddleware<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentMapperMiddleware").field("target", &type_name::<T>()).finish()
    }
}

#[async_trait]
impl<T> Middleware for ContentMapperMiddleware<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn respond(&self, mut request: Request, next: &dyn Responder) -> Result<Response, BoxError> {
        let content = request.content().ok_or(ClientError::BadRequest)?;
        let mapped = T::deserialize(content).map_err(|e| {
            debug!(target_type = type_name::<T>(), cause = %e, "can't map request content");
            ClientError::BadRequest
        })?;

        request.storage_mut().insert(mapped);
        next.respond(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::StatusCode;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::middleware::chain;
    use crate::responder::responder_fn;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Login {
        user: String,
        remember: bool,
    }

    fn mapped() -> Arc<dyn Responder> {
        chain(
            vec![Arc::new(ContentMapperMiddleware::<Login>::new())],
            Arc::new(responder_fn(|request: Request| async move {
                let login = request.storage().get::<Login>().cloned().ok_or(ClientError::BadRequest)?;
                Ok::<_, BoxError>(Response::with_body(StatusCode::OK, login.user))
            })),
        )
    }

    fn with_content(content: serde_json::Value) -> Request {
        let mut request = Request::default();
        request.set_content(content);
        request
    }

    #[tokio::test]
    async fn maps_content_to_type() {
        let request = with_content(json!({"user": "zewo", "remember": true}));
        let response = mapped().respond(request).await.unwrap();
        assert_eq!(response.bytes().map(|b| &b[..]), Some(&b"zewo"[..]));
    }

    #[tokio::test]
    async fn missing_or_invalid_content_is_bad_request() {
        let error = mapped().respond(Request::default()).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ClientError>(), Some(&ClientError::BadRequest));

        let error = mapped().respond(with_content(json!({"user": 42}))).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ClientError>(), Some(&ClientError::BadRequest));
    }
}
