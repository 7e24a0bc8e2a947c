//! Whole-blob decoding for runtimes without the streaming backend.

use std::io::Read;

use serde_json::value::RawValue;

use super::encode_payload;
use crate::error::BlobError;

/// Decode the entire blob into memory, then split it into entries.
///
/// Each value is re-encoded into raw JSON so callers go through the same
/// per-entry decode step as the streaming path.
pub(crate) fn decode_eager<R: Read>(reader: R) -> Result<Vec<(String, Box<RawValue>)>, BlobError> {
    let root: serde_json::Value =
        serde_json::from_reader(reader).map_err(|e| BlobError::from_json(e, true))?;

    let serde_json::Value::Object(entries) = root else {
        return Err(BlobError::NotAMapping);
    };

    entries
        .into_iter()
        .map(|(key, value)| encode_payload(&value).map(|raw| (key, raw)))
        .collect()
}
