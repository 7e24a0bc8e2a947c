//! Sink container for the outermost mapping of a blob.
//!
//! The decoder is driven with a seed that only claims the root value. When
//! the root is an object, each entry is captured as its key plus the raw
//! bytes of its value and handed to a callback; nothing is stored. Values
//! nested inside an entry are never seen here and decode normally later.
//! Any other root is skipped to its end so that syntax errors and trailing
//! data are still reported as such.

use std::fmt;
use std::io::Read;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::value::RawValue;

use crate::error::BlobError;

struct SinkState<F> {
    on_entry: F,
    saw_root: bool,
    not_a_map: bool,
    aborted: Option<BlobError>,
}

struct RootSink<'a, F>(&'a mut SinkState<F>);

impl<'de, F> DeserializeSeed<'de> for RootSink<'_, F>
where
    F: FnMut(String, Box<RawValue>) -> Result<(), BlobError>,
{
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, F> Visitor<'de> for RootSink<'_, F>
where
    F: FnMut(String, Box<RawValue>) -> Result<(), BlobError>,
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a single top-level associative container")
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let state = self.0;
        state.saw_root = true;

        while let Some(key) = map.next_key::<String>()? {
            let raw: Box<RawValue> = map.next_value()?;
            if let Err(err) = (state.on_entry)(key, raw) {
                state.aborted = Some(err);
                return Err(de::Error::custom("entry handler stopped the decode"));
            }
        }

        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        self.0.not_a_map = true;
        Ok(())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<(), E> {
        self.0.not_a_map = true;
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<(), E> {
        self.0.not_a_map = true;
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<(), E> {
        self.0.not_a_map = true;
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<(), E> {
        self.0.not_a_map = true;
        Ok(())
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<(), E> {
        self.0.not_a_map = true;
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        self.0.not_a_map = true;
        Ok(())
    }
}

/// Decode a blob from `reader`, calling `on_entry` for every outermost
/// entry in stream order.
///
/// An error returned by `on_entry` stops decoding and is returned as-is.
/// A root that is not an object yields [`BlobError::NotAMapping`].
pub(crate) fn drive_sink<R, F>(reader: R, on_entry: F) -> Result<(), BlobError>
where
    R: Read,
    F: FnMut(String, Box<RawValue>) -> Result<(), BlobError>,
{
    let mut state = SinkState {
        on_entry,
        saw_root: false,
        not_a_map: false,
        aborted: None,
    };

    let mut de = serde_json::Deserializer::from_reader(reader);
    let result = RootSink(&mut state)
        .deserialize(&mut de)
        .and_then(|()| de.end());

    match result {
        Ok(()) if state.not_a_map => Err(BlobError::NotAMapping),
        Ok(()) => Ok(()),
        Err(err) => match state.aborted.take() {
            Some(aborted) => Err(aborted),
            None => Err(BlobError::from_json(err, state.saw_root)),
        },
    }
}
