use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use mime::Mime;
use strand_http::protocol::{Body, BoxError, ClientError, Request, Response, ServerError};
use strand_runtime::Deadline;
use tracing::{debug, error};

use crate::content::ContentExt;
use crate::media_type::{JsonMediaType, MediaTypeCodec, UrlEncodedFormMediaType};
use crate::middleware::Middleware;
use crate::responder::Responder;

/// Decodes request bodies into content and encodes response content into
/// bodies, by media type.
///
/// A request body is decoded by the first registered type matching its
/// `Content-Type`; an undecodable body is a
/// [`ClientError::BadRequest`]. Response content is encoded with the first
/// registered type matching the most preferred `Accept` range, or with the
/// first registered type when the request has no `Accept`. Content no
/// registered type is acceptable for fails with [`ClientError::NotAcceptable`].
pub struct ContentNegotiationMiddleware {
    media_types: Vec<Arc<dyn MediaTypeCodec>>,
}

impl ContentNegotiationMiddleware {
    pub fn new(media_types: Vec<Arc<dyn MediaTypeCodec>>) -> Self {
        Self { media_types }
    }

    fn find(&self, mime: &Mime) -> Option<&dyn MediaTypeCodec> {
        self.media_types.iter().find(|codec| codec.matches(mime)).map(AsRef::as_ref)
    }

    fn negotiate(&self, accepted: &[Mime]) -> Option<&dyn MediaTypeCodec> {
        if accepted.is_empty() {
            return self.media_types.first().map(AsRef::as_ref);
        }
        accepted.iter().find_map(|range| {
            self.media_types.iter().map(AsRef::as_ref).find(|codec| in_range(codec.media_type(), range))
        })
    }

    async fn decode_body(&self, request: &mut Request) -> Result<(), BoxError> {
        if request.body().as_bytes().is_some_and(|bytes| bytes.is_empty()) {
            return Ok(());
        }
        let Some(codec) = request.content_type().and_then(|mime| self.find(&mime)) else {
            return Ok(());
        };

        let bytes = request.body_mut().become_buffer(Deadline::never()).await?;
        if bytes.is_empty() {
            return Ok(());
        }
        let content = codec.decode(&bytes).map_err(|e| {
            debug!(media_type = %codec.media_type(), cause = %e, "can't decode request body");
            ClientError::BadRequest
        })?;
        request.set_content(content);
        Ok(())
    }
}

impl Default for ContentNegotiationMiddleware {
    /// JSON first, then URL-encoded forms.
    fn default() -> Self {
        Self::new(vec![Arc::new(JsonMediaType::default()), Arc::new(UrlEncodedFormMediaType::default())])
    }
}

impl fmt::Debug for ContentNegotiationMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let media_types: Vec<_> = self.media_types.iter().map(|codec| codec.media_type().essence_str()).collect();
        f.debug_struct("ContentNegotiationMiddleware").field("media_types", &media_types).finish()
    }
}

#[async_trait]
impl Middleware for ContentNegotiationMiddleware {
    async fn respond(&self, mut request: Request, next: &dyn Responder) -> Result<Response, BoxError> {
        self.decode_body(&mut request).await?;
        let accepted = accepted_ranges(request.headers());

        let mut response = next.respond(request).await?;
        let Some(content) = response.take_content() else {
            return Ok(response);
        };

        let codec = self.negotiate(&accepted).ok_or(ClientError::NotAcceptable)?;
        let body = codec.encode(&content).map_err(|e| {
            error!(media_type = %codec.media_type(), cause = %e, "can't encode response content");
            ServerError::InternalServerError
        })?;

        let content_type = HeaderValue::from_str(&format!("{}; charset=utf-8", codec.media_type().essence_str()))?;
        response.headers_mut().insert(CONTENT_TYPE, content_type);
        *response.body_mut() = Body::from(body);
        Ok(response)
    }
}

/// `Accept` media ranges, most preferred first.
///
/// Ranges with `q=0` are dropped; unparsable entries are skipped.
fn accepted_ranges(headers: &HeaderMap) -> Vec<Mime> {
    let mut ranges: Vec<(Mime, f32)> = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|range| range.trim().parse::<Mime>().ok())
        .map(|mime| {
            let quality = mime.get_param("q").and_then(|q| q.as_str().parse().ok()).unwrap_or(1.0);
            (mime, quality)
        })
        .filter(|(_, quality)| *quality > 0.0)
        .collect();

    ranges.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    ranges.into_iter().map(|(mime, _)| mime).collect()
}

fn in_range(media_type: &Mime, range: &Mime) -> bool {
    if range.type_() == mime::STAR {
        return true;
    }
    range.type_() == media_type.type_() && (range.subtype() == mime::STAR || range.subtype() == media_type.subtype())
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::content::content_response;
    use crate::middleware::chain;
    use crate::responder::responder_fn;

    fn request(content_type: &'static str, accept: Option<&'static str>, body: &'static str) -> Request {
        let mut builder = Request::builder().header(CONTENT_TYPE, HeaderValue::from_static(content_type)).body(body);
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, HeaderValue::from_static(accept));
        }
        builder.build()
    }

    fn fuu_baz() -> Arc<dyn Responder> {
        chain(
            vec![Arc::new(ContentNegotiationMiddleware::default())],
            Arc::new(responder_fn(|request: Request| async move {
                assert_eq!(request.content(), Some(&json!({"foo": "bar"})));
                Ok::<_, BoxError>(content_response(StatusCode::OK, &json!({"fuu": "baz"}))?)
            })),
        )
    }

    async fn negotiate(request: Request) -> Result<Response, BoxError> {
        fuu_baz().respond(request).await
    }

    #[tokio::test]
    async fn json_request_and_response() {
        let response = negotiate(request("application/json; charset=utf-8", None, r#"{"foo":"bar"}"#)).await.unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(response.body(), &Body::from(r#"{"fuu":"baz"}"#));
    }

    #[tokio::test]
    async fn form_request_defaults_to_json_response() {
        let response = negotiate(request("application/x-www-form-urlencoded; charset=utf-8", None, "foo=bar")).await.unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(response.body(), &Body::from(r#"{"fuu":"baz"}"#));
    }

    #[tokio::test]
    async fn form_request_and_response() {
        let request = request(
            "application/x-www-form-urlencoded; charset=utf-8",
            Some("application/x-www-form-urlencoded"),
            "foo=bar",
        );
        let response = negotiate(request).await.unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "application/x-www-form-urlencoded; charset=utf-8");
        assert_eq!(response.body(), &Body::from("fuu=baz"));
    }

    #[tokio::test]
    async fn accept_quality_and_wildcards() {
        let accept = "text/html, application/json;q=0.5, application/x-www-form-urlencoded;q=0.9";
        let response = negotiate(request("application/json", Some(accept), r#"{"foo":"bar"}"#)).await.unwrap();
        assert_eq!(response.body(), &Body::from("fuu=baz"));

        let response = negotiate(request("application/json", Some("text/plain, application/*"), r#"{"foo":"bar"}"#)).await.unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=utf-8");

        let response = negotiate(request("application/json", Some("*/*"), r#"{"foo":"bar"}"#)).await.unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
    }

    #[tokio::test]
    async fn nothing_acceptable() {
        let error = negotiate(request("application/json", Some("text/html"), r#"{"foo":"bar"}"#)).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ClientError>(), Some(&ClientError::NotAcceptable));
    }

    #[tokio::test]
    async fn undecodable_body_is_bad_request() {
        let error = negotiate(request("application/json", None, "{foo")).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ClientError>(), Some(&ClientError::BadRequest));
    }

    #[tokio::test]
    async fn plain_responses_pass_through() {
        let responder = chain(
            vec![Arc::new(ContentNegotiationMiddleware::default())],
            Arc::new(responder_fn(|request: Request| async move {
                assert!(request.content().is_none());
                Ok::<_, BoxError>(Response::with_body(StatusCode::OK, "plain"))
            })),
        );

        let response = responder.respond(request("text/plain", Some("application/json"), "ignored")).await.unwrap();
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(response.body(), &Body::from("plain"));
    }
}
