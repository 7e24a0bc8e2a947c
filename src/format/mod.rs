//! Blob format: a single JSON object whose entries are `(key, payload)` pairs.
//!
//! This module provides:
//! - `Payload`: the emptiness predicate every stored value exposes
//! - `HistKey`: a plain or compound entry identifier
//! - the sink container that forwards outermost entries to a callback
//!   (`drive_sink`) and the eager whole-blob decoder (`decode_eager`)
//! - `decode_key` / `decode_payload`: the shared per-entry decode step

use serde::{
    Serialize,
    de::{DeserializeOwned, IntoDeserializer},
};
use serde_json::value::RawValue;

use crate::error::{BlobError, bare_message};

mod eager;
mod key;
mod sink;

pub(crate) use eager::decode_eager;
pub use key::HistKey;
pub(crate) use sink::drive_sink;

/// A stored value that can report whether it holds any content.
///
/// Filtering with `allow_empty = false` drops every entry whose value
/// returns `true` here.
pub trait Payload {
    /// Returns `true` when the value carries no content.
    fn is_empty(&self) -> bool;
}

impl Payload for serde_json::Value {
    fn is_empty(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(fields) => fields.is_empty(),
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
        }
    }
}

/// Decode an entry key from its textual form in the blob.
pub(crate) fn decode_key<K: DeserializeOwned>(key: &str) -> Result<K, BlobError> {
    let de: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
        key.into_deserializer();
    K::deserialize(de).map_err(|e| BlobError::payload(key, &e))
}

/// Decode an entry value from its raw JSON text.
pub(crate) fn decode_payload<T: DeserializeOwned>(
    key: &str,
    raw: &RawValue,
) -> Result<T, BlobError> {
    serde_json::from_str(raw.get()).map_err(|e| BlobError::payload(key, &bare_message(&e)))
}

/// Encode a decoded value back into raw JSON text.
pub(crate) fn encode_payload<T: Serialize + ?Sized>(value: &T) -> Result<Box<RawValue>, BlobError> {
    serde_json::value::to_raw_value(value).map_err(|e| BlobError::Encode(e.to_string()))
}
