//! Application level HTTP errors and their status codes.
//!
//! Responders raise [`ClientError`] or [`ServerError`] to end a request
//! with a bare status response; [`recover`] performs that conversion.

use http::StatusCode;
use thiserror::Error;

use crate::protocol::{BoxError, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ClientError {
    #[error("bad request")]
    BadRequest,
    #[error("unauthorized")]
    Unauthorized,
    #[error("payment required")]
    PaymentRequired,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("not acceptable")]
    NotAcceptable,
    #[error("proxy authentication required")]
    ProxyAuthenticationRequired,
    #[error("request timeout")]
    RequestTimeout,
    #[error("conflict")]
    Conflict,
    #[error("gone")]
    Gone,
    #[error("length required")]
    LengthRequired,
    #[error("precondition failed")]
    PreconditionFailed,
    #[error("request entity too large")]
    RequestEntityTooLarge,
    #[error("request uri too long")]
    RequestUriTooLong,
    #[error("unsupported media type")]
    UnsupportedMediaType,
    #[error("requested range not satisfiable")]
    RequestedRangeNotSatisfiable,
    #[error("expectation failed")]
    ExpectationFailed,
    #[error("i'm a teapot")]
    ImATeapot,
    #[error("authentication timeout")]
    AuthenticationTimeout,
    #[error("enhance your calm")]
    EnhanceYourCalm,
    #[error("unprocessable entity")]
    UnprocessableEntity,
    #[error("locked")]
    Locked,
    #[error("failed dependency")]
    FailedDependency,
    #[error("precondition required")]
    PreconditionRequired,
    #[error("too many requests")]
    TooManyRequests,
    #[error("request header fields too large")]
    RequestHeaderFieldsTooLarge,
}

impl ClientError {
    pub fn status(&self) -> StatusCode {
        match self {
            ClientError::BadRequest => StatusCode::BAD_REQUEST,
            ClientError::Unauthorized => StatusCode::UNAUTHORIZED,
            ClientError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            ClientError::Forbidden => StatusCode::FORBIDDEN,
            ClientError::NotFound => StatusCode::NOT_FOUND,
            ClientError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ClientError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            ClientError::ProxyAuthenticationRequired => StatusCode::PROXY_AUTHENTICATION_REQUIRED,
            ClientError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ClientError::Conflict => StatusCode::CONFLICT,
            ClientError::Gone => StatusCode::GONE,
            ClientError::LengthRequired => StatusCode::LENGTH_REQUIRED,
            ClientError::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            ClientError::RequestEntityTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ClientError::RequestUriTooLong => StatusCode::URI_TOO_LONG,
            ClientError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ClientError::RequestedRangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            ClientError::ExpectationFailed => StatusCode::EXPECTATION_FAILED,
            ClientError::ImATeapot => StatusCode::IM_A_TEAPOT,
            ClientError::AuthenticationTimeout => non_standard(419),
            ClientError::EnhanceYourCalm => non_standard(420),
            ClientError::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ClientError::Locked => StatusCode::LOCKED,
            ClientError::FailedDependency => StatusCode::FAILED_DEPENDENCY,
            ClientError::PreconditionRequired => StatusCode::PRECONDITION_REQUIRED,
            ClientError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ClientError::RequestHeaderFieldsTooLarge => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ServerError {
    #[error("internal server error")]
    InternalServerError,
    #[error("not implemented")]
    NotImplemented,
    #[error("bad gateway")]
    BadGateway,
    #[error("service unavailable")]
    ServiceUnavailable,
    #[error("gateway timeout")]
    GatewayTimeout,
    #[error("http version not supported")]
    HttpVersionNotSupported,
    #[error("variant also negotiates")]
    VariantAlsoNegotiates,
    #[error("insufficient storage")]
    InsufficientStorage,
    #[error("loop detected")]
    LoopDetected,
    #[error("not extended")]
    NotExtended,
    #[error("network authentication required")]
    NetworkAuthenticationRequired,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ServerError::BadGateway => StatusCode::BAD_GATEWAY,
            ServerError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            ServerError::HttpVersionNotSupported => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            ServerError::VariantAlsoNegotiates => StatusCode::VARIANT_ALSO_NEGOTIATES,
            ServerError::InsufficientStorage => StatusCode::INSUFFICIENT_STORAGE,
            ServerError::LoopDetected => StatusCode::LOOP_DETECTED,
            ServerError::NotExtended => StatusCode::NOT_EXTENDED,
            ServerError::NetworkAuthenticationRequired => StatusCode::NETWORK_AUTHENTICATION_REQUIRED,
        }
    }
}

fn non_standard(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// Maps a [`ClientError`] or [`ServerError`] to an empty response with its status.
///
/// Any other error yields `None`.
pub fn recover(error: &BoxError) -> Option<Response> {
    if let Some(e) = error.downcast_ref::<ClientError>() {
        return Some(Response::new(e.status()));
    }
    if let Some(e) = error.downcast_ref::<ServerError>() {
        return Some(Response::new(e.status()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ClientError::BadRequest.status().as_u16(), 400);
        assert_eq!(ClientError::NotAcceptable.status().as_u16(), 406);
        assert_eq!(ClientError::AuthenticationTimeout.status().as_u16(), 419);
        assert_eq!(ClientError::EnhanceYourCalm.status().as_u16(), 420);
        assert_eq!(ServerError::NotImplemented.status().as_u16(), 501);
        assert_eq!(ServerError::NetworkAuthenticationRequired.status().as_u16(), 511);
    }

    #[test]
    fn recover_known_errors() {
        let error: BoxError = Box::new(ClientError::NotFound);
        assert_eq!(recover(&error).map(|r| r.status()), Some(StatusCode::NOT_FOUND));

        let error: BoxError = Box::new(ServerError::BadGateway);
        assert_eq!(recover(&error).map(|r| r.status()), Some(StatusCode::BAD_GATEWAY));

        let error: BoxError = "something else".into();
        assert!(recover(&error).is_none());
    }
}
