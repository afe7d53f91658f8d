//! Codecs between body bytes and structured [`Value`]s.
//!
//! [`ContentNegotiationMiddleware`](crate::middleware::ContentNegotiationMiddleware)
//! holds an ordered list of them: request bodies are decoded by the codec
//! matching `Content-Type`, responses encoded by the first codec matching
//! `Accept`.

use bytes::Bytes;
use mime::Mime;
use serde_json::Value;
use thiserror::Error;

mod json;
mod url_encoded;

pub use json::JsonMediaType;
pub use url_encoded::UrlEncodedFormMediaType;

#[derive(Error, Debug)]
pub enum MediaTypeError {
    #[error("invalid json: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid form: {source}")]
    FormDecode {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("can't encode form: {source}")]
    FormEncode {
        #[from]
        source: serde_urlencoded::ser::Error,
    },

    #[error("unsupported content: {reason}")]
    Unsupported { reason: String },
}

impl MediaTypeError {
    pub fn unsupported<S: ToString>(reason: S) -> Self {
        Self::Unsupported { reason: reason.to_string() }
    }
}

pub trait MediaTypeCodec: Send + Sync {
    /// The type written to `Content-Type`, without parameters.
    fn media_type(&self) -> &Mime;

    /// Whether this codec handles `mime`; parameters such as `charset` are ignored.
    fn matches(&self, mime: &Mime) -> bool {
        let own = self.media_type();
        own.type_() == mime.type_() && own.subtype() == mime.subtype()
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, MediaTypeError>;

    fn encode(&self, value: &Value) -> Result<Bytes, MediaTypeError>;
}
