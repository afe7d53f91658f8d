//! Core HTTP protocol types.
//!
//! # Components
//!
//! - **Messages**: [`Request`] / [`RequestHead`], [`Response`] / [`ResponseHead`],
//!   the [`Uri`] request target and [`Cookie`] / [`AttributedCookie`]
//! - **Bodies** ([`body`]): the [`Body`] tri-state of buffer, receiver and sender
//! - **Decoder events**: [`Message`], [`PayloadItem`] and [`PayloadSize`]
//! - **Errors**: [`ParseError`], [`SendError`] and [`BodyError`] per layer,
//!   [`HttpError`] at the connection level, and the application level
//!   [`ClientError`] / [`ServerError`] tables with [`recover`]

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod uri;
pub use uri::Uri;
pub use uri::UriError;
pub use uri::UserInfo;

mod cookie;
pub use cookie::AttributedCookie;
pub use cookie::Cookie;

mod request;
pub use request::PathParameters;
pub use request::Request;
pub use request::RequestBuilder;
pub use request::RequestHead;
pub(crate) use request::is_keep_alive;

mod response;
pub use response::Response;
pub use response::ResponseBuilder;
pub use response::ResponseHead;
pub use response::Upgrade;
pub use response::boxed_upgrade;

mod error;
pub use error::BodyError;
pub use error::BoxError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

mod status;
pub use status::ClientError;
pub use status::ServerError;
pub use status::recover;

pub mod body;
pub use body::Body;
