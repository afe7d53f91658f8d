use bytes::Bytes;
use mime::Mime;
use serde_json::{Map, Value};

use crate::media_type::{MediaTypeCodec, MediaTypeError};

/// `application/x-www-form-urlencoded`
///
/// Forms are flat: they decode to an object of strings, and only objects
/// of scalars encode. A repeated key keeps its last value.
#[derive(Debug, Clone)]
pub struct UrlEncodedFormMediaType {
    mime: Mime,
}

impl Default for UrlEncodedFormMediaType {
    fn default() -> Self {
        Self { mime: mime::APPLICATION_WWW_FORM_URLENCODED }
    }
}

impl MediaTypeCodec for UrlEncodedFormMediaType {
    fn media_type(&self) -> &Mime {
        &self.mime
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, MediaTypeError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes)?;
        Ok(Value::Object(pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect::<Map<_, _>>()))
    }

    fn encode(&self, value: &Value) -> Result<Bytes, MediaTypeError> {
        let Value::Object(map) = value else {
            return Err(MediaTypeError::unsupported("form content must be an object"));
        };

        let pairs = map
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Null => String::new(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.clone(),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(MediaTypeError::unsupported(format!("form field '{key}' is not a scalar")));
                    }
                };
                Ok((key.as_str(), value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(serde_urlencoded::to_string(pairs)?.into())
    }
}
