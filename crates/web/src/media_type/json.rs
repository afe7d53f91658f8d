use bytes::Bytes;
use mime::Mime;
use serde_json::Value;

use crate::media_type::{MediaTypeCodec, MediaTypeError};

/// `application/json`
#[derive(Debug, Clone)]
pub struct JsonMediaType {
    mime: Mime,
}

impl Default for JsonMediaType {
    fn default() -> Self {
        Self { mime: mime::APPLICATION_JSON }
    }
}

impl MediaTypeCodec for JsonMediaType {
    fn media_type(&self) -> &Mime {
        &self.mime
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, MediaTypeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode(&self, value: &Value) -> Result<Bytes, MediaTypeError> {
        Ok(serde_json::to_vec(value)?.into())
    }
}
