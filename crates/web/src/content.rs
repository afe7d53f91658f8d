//! Structured content carried in a message's storage.
//!
//! Content negotiation stores the decoded request body as [`Content`] and
//! encodes the [`Content`] of a response into its body. Responders use the
//! [`ContentExt`] accessors on both.

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use strand_http::protocol::{Request, Response};

#[derive(Debug, Clone, PartialEq)]
pub struct Content(pub Value);

pub trait ContentExt {
    fn content(&self) -> Option<&Value>;

    fn set_content(&mut self, content: Value);

    fn take_content(&mut self) -> Option<Value>;
}

impl ContentExt for Request {
    fn content(&self) -> Option<&Value> {
        self.storage().get::<Content>().map(|c| &c.0)
    }

    fn set_content(&mut self, content: Value) {
        self.storage_mut().insert(Content(content));
    }

    fn take_content(&mut self) -> Option<Value> {
        self.storage_mut().remove::<Content>().map(|c| c.0)
    }
}

impl ContentExt for Response {
    fn content(&self) -> Option<&Value> {
        self.storage().get::<Content>().map(|c| &c.0)
    }

    fn set_content(&mut self, content: Value) {
        self.storage_mut().insert(Content(content));
    }

    fn take_content(&mut self) -> Option<Value> {
        self.storage_mut().remove::<Content>().map(|c| c.0)
    }
}

/// A response whose body is `content`, encoded later by content negotiation.
pub fn content_response<T: Serialize + ?Sized>(status: StatusCode, content: &T) -> Result<Response, serde_json::Error> {
    let mut response = Response::new(status);
    response.set_content(serde_json::to_value(content)?);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Serialize)]
    struct User {
        name: &'static str,
        age: u8,
    }

    #[test]
    fn request_content() {
        let mut request = Request::default();
        assert!(request.content().is_none());

        request.set_content(json!({"foo": "bar"}));
        assert_eq!(request.content(), Some(&json!({"foo": "bar"})));
        assert_eq!(request.take_content(), Some(json!({"foo": "bar"})));
        assert!(request.content().is_none());
    }

    #[test]
    fn response_from_serializable() {
        let response = content_response(StatusCode::CREATED, &User { name: "zewo", age: 3 }).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.content(), Some(&json!({"name": "zewo", "age": 3})));
    }
}
