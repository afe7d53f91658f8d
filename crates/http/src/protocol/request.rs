//! HTTP requests.
//!
//! A [`Request`] is the decoded [`RequestHead`] plus a [`Body`], a typed
//! `storage` bag that middleware uses to pass values inward, and the path
//! parameters captured by the router.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use http::header::{CONNECTION, CONTENT_TYPE, COOKIE, IntoHeaderName, UPGRADE};
use http::{Extensions, HeaderMap, HeaderValue, Method, Version};
use mime::Mime;

use crate::protocol::{Body, ClientError, Cookie, Uri};
use crate::utils::has_token;

/// Request line and headers, as produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
}

impl Default for RequestHead {
    fn default() -> Self {
        Self { method: Method::GET, uri: Uri::default(), version: Version::HTTP_11, headers: HeaderMap::new() }
    }
}

impl RequestHead {
    pub fn into_request(self, body: Body) -> Request {
        Request::from_parts(self, body)
    }

    pub fn is_keep_alive(&self) -> bool {
        is_keep_alive(self.version, &self.headers)
    }

    /// Whether the request expects an interim `100 Continue`.
    pub fn expects_continue(&self) -> bool {
        self.version == Version::HTTP_11
            && self.headers.get(http::header::EXPECT).is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"100-continue"))
    }
}

/// Values captured from `:name` segments of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParameters {
    inner: HashMap<String, String>,
}

impl PathParameters {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.inner.remove(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for PathParameters {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

pub struct Request {
    head: RequestHead,
    body: Body,
    storage: Extensions,
    path_parameters: PathParameters,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self::from_parts(RequestHead { method, uri, ..Default::default() }, Body::empty())
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn from_parts(head: RequestHead, body: Body) -> Self {
        Self { head, body, storage: Extensions::new(), path_parameters: PathParameters::default() }
    }

    pub fn into_parts(self) -> (RequestHead, Body) {
        (self.head, self.body)
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn uri_mut(&mut self) -> &mut Uri {
        &mut self.head.uri
    }

    /// The decoded path, `/` when the target has none.
    pub fn path(&self) -> &str {
        self.head.uri.path().unwrap_or("/")
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

    pub fn path_parameters(&self) -> &PathParameters {
        &self.path_parameters
    }

    pub fn path_parameters_mut(&mut self) -> &mut PathParameters {
        &mut self.path_parameters
    }

    /// Parses the path parameter `name`.
    ///
    /// A missing or unparsable parameter is a client error.
    pub fn path_parameter<T: FromStr>(&self, name: &str) -> Result<T, ClientError> {
        self.path_parameters.get(name).ok_or(ClientError::BadRequest)?.parse().map_err(|_e| ClientError::BadRequest)
    }

    pub fn is_keep_alive(&self) -> bool {
        self.head.is_keep_alive()
    }

    pub fn is_upgrade(&self) -> bool {
        self.head.headers.contains_key(UPGRADE)
            && self.head.headers.get_all(CONNECTION).iter().any(|v| has_token(v.as_bytes(), "upgrade"))
    }

    pub fn content_type(&self) -> Option<Mime> {
        self.head.headers.get(CONTENT_TYPE)?.to_str().ok()?.parse().ok()
    }

    /// Cookies sent in `Cookie` headers; malformed headers are skipped.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.head
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(Cookie::parse_header)
            .flatten()
            .collect()
    }
}

pub(crate) fn is_keep_alive(version: Version, headers: &HeaderMap) -> bool {
    let connection = headers.get_all(CONNECTION);
    match version {
        Version::HTTP_11 => !connection.iter().any(|v| has_token(v.as_bytes(), "close")),
        Version::HTTP_10 => connection.iter().any(|v| has_token(v.as_bytes(), "keep-alive")),
        _ => false,
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::from_parts(RequestHead::default(), Body::empty())
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.head.method)
            .field("uri", &self.head.uri.as_str())
            .field("version", &self.head.version)
            .field("headers", &self.head.headers)
            .field("body", &self.body)
            .field("path_parameters", &self.path_parameters)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct RequestBuilder {
    head: RequestHead,
    body: Body,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.head.method = method;
        self
    }

    pub fn uri(mut self, uri: Uri) -> Self {
        self.head.uri = uri;
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

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        Request::from_parts(self.head, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(version: Version, connection: Option<&'static str>) -> Request {
        let mut builder = Request::builder().version(version);
        if let Some(connection) = connection {
            builder = builder.header(CONNECTION, HeaderValue::from_static(connection));
        }
        builder.build()
    }

    #[test]
    fn keep_alive_defaults() {
        assert!(request(Version::HTTP_11, None).is_keep_alive());
        assert!(!request(Version::HTTP_11, Some("close")).is_keep_alive());
        assert!(!request(Version::HTTP_10, None).is_keep_alive());
        assert!(request(Version::HTTP_10, Some("Keep-Alive")).is_keep_alive());
    }

    #[test]
    fn upgrade_needs_both_headers() {
        let request = Request::builder()
            .header(CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"))
            .header(UPGRADE, HeaderValue::from_static("websocket"))
            .build();
        assert!(request.is_upgrade());

        let request = Request::builder().header(UPGRADE, HeaderValue::from_static("websocket")).build();
        assert!(!request.is_upgrade());
    }

    #[test]
    fn typed_path_parameters() {
        let mut request = Request::default();
        request.path_parameters_mut().insert("id", "42");
        request.path_parameters_mut().insert("name", "zewo");

        assert_eq!(request.path_parameter::<u32>("id"), Ok(42));
        assert_eq!(request.path_parameter::<u32>("name"), Err(ClientError::BadRequest));
        assert_eq!(request.path_parameter::<String>("missing"), Err(ClientError::BadRequest));
    }

    #[test]
    fn content_type_and_cookies() {
        let request = Request::builder()
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"))
            .header(COOKIE, HeaderValue::from_static("server=zewo; lang=swift"))
            .build();

        let mime = request.content_type().unwrap();
        assert_eq!(mime.essence_str(), "application/json");
        assert_eq!(request.cookies(), vec![Cookie::new("server", "zewo"), Cookie::new("lang", "swift")]);
    }

    #[test]
    fn defaults() {
        let request = Request::default();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.body(), &Body::empty());
    }
}
