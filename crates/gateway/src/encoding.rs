//! Re-encoding of decoded payloads for body-bearing methods.
//!
//! The gateway decodes the client's body into a [`serde_json::Value`] before routing; builders that rewrite
//! the body turn it back into bytes through a [`PayloadEncoder`]. The only production encoder is
//! [`JsonEncoder`], which keeps object keys in their input order so the upstream sees the same document the
//! client sent.

use crate::error::EncodingError;
use bytes::{BufMut, Bytes, BytesMut};
use http::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

const APPLICATION_JSON: &str = "application/json";

/// Turns a decoded payload back into body bytes.
#[cfg_attr(test, mockall::automock)]
pub trait PayloadEncoder: Send + Sync {
    fn encode(&self, payload: &Value) -> Result<Bytes, EncodingError>;

    /// The `Content-Type` describing the bytes produced by [`PayloadEncoder::encode`].
    fn content_type(&self) -> HeaderValue;
}

#[derive(Default, Clone, Copy, Debug)]
pub struct JsonEncoder;

pub(crate) static JSON_ENCODER: JsonEncoder = JsonEncoder;

impl JsonEncoder {
    /// Encodes any serializable value; fails on values json can't represent, e.g. maps with non-string keys.
    pub fn encode_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, EncodingError> {
        let mut writer = BytesMut::with_capacity(128).writer();
        serde_json::to_writer(&mut writer, value).map_err(|e| {
            error!(cause = %e, "failed to encode payload");
            EncodingError::from(e)
        })?;
        Ok(writer.into_inner().freeze())
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, EncodingError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl PayloadEncoder for JsonEncoder {
    fn encode(&self, payload: &Value) -> Result<Bytes, EncodingError> {
        self.encode_value(payload)
    }

    fn content_type(&self) -> HeaderValue {
        HeaderValue::from_static(APPLICATION_JSON)
    }
}
