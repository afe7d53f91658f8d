//! HTTP responses.
//!
//! Besides status, headers and [`Body`], a [`Response`] carries the cookies
//! to set and an optional [`Upgrade`] callback. When present, the
//! connection hands the raw stream to the callback once the response head
//! has been written, and closes the connection when it returns.

use std::fmt;
use std::future::Future;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use http::header::IntoHeaderName;
use http::{Extensions, HeaderMap, HeaderValue, StatusCode, Version};
use strand_runtime::stream::{ReceivingStream, Stream, StreamError};

use crate::protocol::body::BodySink;
use crate::protocol::{AttributedCookie, Body};

/// Takes over the connection after a `101 Switching Protocols` style response.
pub type Upgrade = Box<dyn for<'a> FnOnce(&'a mut dyn Stream) -> BoxFuture<'a, Result<(), StreamError>> + Send>;

/// Status line, headers and cookies, as produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub cookies: Vec<AttributedCookie>,
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self { status: StatusCode::OK, version: Version::HTTP_11, headers: HeaderMap::new(), cookies: Vec::new() }
    }
}

impl ResponseHead {
    pub fn into_response(self, body: Body) -> Response {
        Response::from_parts(self, body)
    }

    /// Statuses that never carry a body.
    pub fn is_bodiless(&self) -> bool {
        self.status.is_informational() || self.status == StatusCode::NO_CONTENT || self.status == StatusCode::NOT_MODIFIED
    }
}

pub struct Response {
    head: ResponseHead,
    body: Body,
    storage: Extensions,
    upgrade: Option<Upgrade>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self::from_parts(ResponseHead { status, ..Default::default() }, Body::empty())
    }

    pub fn with_body(status: StatusCode, body: impl Into<Body>) -> Self {
        Self::from_parts(ResponseHead { status, ..Default::default() }, body.into())
    }

    pub fn with_receiver(status: StatusCode, receiver: impl ReceivingStream + 'static) -> Self {
        Self::with_body(status, Body::receiver(receiver))
    }

    pub fn with_sender<F, Fut>(status: StatusCode, producer: F) -> Self
    where
        F: FnOnce(BodySink) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StreamError>> + Send + 'static,
    {
        Self::with_body(status, Body::sender(producer))
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn from_parts(head: ResponseHead, body: Body) -> Self {
        Self { head, body, storage: Extensions::new(), upgrade: None }
    }

    pub fn into_parts(self) -> (ResponseHead, Body) {
        (self.head, self.body)
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    pub fn status_mut(&mut self) -> &mut StatusCode {
        &mut self.head.status
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.head.headers
    }

    pub fn cookies(&self) -> &[AttributedCookie] {
        &self.head.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut Vec<AttributedCookie> {
        &mut self.head.cookies
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn storage(&self) -> &Extensions {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Extensions {
        &mut self.storage
    }

    pub fn has_upgrade(&self) -> bool {
        self.upgrade.is_some()
    }

    pub fn set_upgrade<F>(&mut self, upgrade: F)
    where
        F: for<'a> FnOnce(&'a mut dyn Stream) -> BoxFuture<'a, Result<(), StreamError>> + Send + 'static,
    {
        self.upgrade = Some(Box::new(upgrade));
    }

    pub fn take_upgrade(&mut self) -> Option<Upgrade> {
        self.upgrade.take()
    }

    /// The body bytes when the body is buffered.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.body.as_bytes()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.head.status)
            .field("version", &self.head.version)
            .field("headers", &self.head.headers)
            .field("cookies", &self.head.cookies)
            .field("body", &self.body)
            .field("upgrade", &self.upgrade.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ResponseBuilder {
    head: ResponseHead,
    body: Body,
    upgrade: Option<Upgrade>,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.head.status = status;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.head.version = version;
        self
    }

    /// Appends a header, keeping earlier values of the same name.
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.head.headers.append(name, value);
        self
    }

    pub fn cookie(mut self, cookie: AttributedCookie) -> Self {
        self.head.cookies.push(cookie);
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn upgrade<F>(mut self, upgrade: F) -> Self
    where
        F: for<'a> FnOnce(&'a mut dyn Stream) -> BoxFuture<'a, Result<(), StreamError>> + Send + 'static,
    {
        self.upgrade = Some(Box::new(upgrade));
        self
    }

    pub fn build(self) -> Response {
        let mut response = Response::from_parts(self.head, self.body);
        response.upgrade = self.upgrade;
        response
    }
}

/// Boxes an async upgrade body, for use with [`ResponseBuilder::upgrade`].
///
/// ```ignore
/// Response::builder()
///     .status(StatusCode::SWITCHING_PROTOCOLS)
///     .upgrade(|stream| boxed_upgrade(async move { stream.send(b"hi", Deadline::never()).await }))
///     .build();
/// ```
pub fn boxed_upgrade<'a, Fut>(future: Fut) -> BoxFuture<'a, Result<(), StreamError>>
where
    Fut: Future<Output = Result<(), StreamError>> + Send + 'a,
{
    future.boxed()
}
