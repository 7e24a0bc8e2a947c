//! Public iteration API over a blob's entries.
//!
//! Every entry point picks its backend from [`ReadOptions::backend`]: the
//! streaming decoder when the runtime supports it, the eager decoder
//! otherwise. Both apply the same per-entry decode and filter, so callers
//! see the same entries, order and errors either way.

use std::hash::Hash;
use std::iter::FusedIterator;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use tracing::debug;

use crate::config::{MaterializeMode, MaterializeSetting, ReadOptions};
use crate::error::BlobError;
use crate::format::{self, Payload};
use crate::io::{BlobSource, FileSource, decompress};
use crate::lazy::LazyValue;
use crate::stream::{SessionState, StreamingMapDecoder};

/// Iterator over the `(key, value)` entries of a blob.
///
/// Streaming sessions stop their worker when closed or dropped; eager
/// iterators simply hold the already decoded entries.
pub struct Entries<K, V> {
    inner: Inner<K, V>,
}

/// Entries whose values are decoded on demand.
pub type LazyEntries<K, T> = Entries<K, LazyValue<T>>;

enum Inner<K, V> {
    Streaming(StreamingMapDecoder<K, V>),
    Eager(std::vec::IntoIter<(K, V)>),
}

impl<K, V> Entries<K, V> {
    fn streaming(decoder: StreamingMapDecoder<K, V>) -> Self {
        Self {
            inner: Inner::Streaming(decoder),
        }
    }

    fn eager(entries: Vec<(K, V)>) -> Self {
        Self {
            inner: Inner::Eager(entries.into_iter()),
        }
    }

    /// Whether entries come from a streaming session.
    pub fn is_streaming(&self) -> bool {
        matches!(self.inner, Inner::Streaming(_))
    }

    /// State of the streaming session, if there is one.
    pub fn session_state(&self) -> Option<SessionState> {
        match &self.inner {
            Inner::Streaming(decoder) => Some(decoder.state()),
            Inner::Eager(_) => None,
        }
    }

    /// Stop iterating and release the underlying source.
    ///
    /// For a streaming session this joins the worker; no further bytes are
    /// read from the source once it returns.
    pub fn close(&mut self) {
        match &mut self.inner {
            Inner::Streaming(decoder) => decoder.close(),
            Inner::Eager(remaining) => *remaining = Vec::new().into_iter(),
        }
    }
}

impl<K, V> Iterator for Entries<K, V> {
    type Item = Result<(K, V), BlobError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Streaming(decoder) => decoder.next(),
            Inner::Eager(remaining) => remaining.next().map(Ok),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Inner::Streaming(_) => (0, None),
            Inner::Eager(remaining) => remaining.size_hint(),
        }
    }
}

impl<K, V> FusedIterator for Entries<K, V> {}

impl<K, V> std::fmt::Debug for Entries<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Inner::Streaming(decoder) => f.debug_tuple("Entries").field(decoder).finish(),
            Inner::Eager(remaining) => f
                .debug_struct("Entries")
                .field("remaining", &remaining.len())
                .finish(),
        }
    }
}

/// Result of [`iterate_or_materialize`].
#[derive(Debug)]
pub enum Materialized<K, T> {
    /// Entries for direct streaming consumption
    Entries(Entries<K, T>),
    /// Every entry decoded, in blob order
    Map(IndexMap<K, T>),
}

impl<K: Hash + Eq, T> Materialized<K, T> {
    /// Collect into an ordered map, draining the iterator if needed.
    pub fn into_map(self) -> Result<IndexMap<K, T>, BlobError> {
        match self {
            Materialized::Entries(entries) => entries.collect(),
            Materialized::Map(map) => Ok(map),
        }
    }

    /// The map, if entries were materialized.
    pub fn as_map(&self) -> Option<&IndexMap<K, T>> {
        match self {
            Materialized::Map(map) => Some(map),
            Materialized::Entries(_) => None,
        }
    }

    /// The entry iterator, if entries were left lazy.
    pub fn into_entries(self) -> Option<Entries<K, T>> {
        match self {
            Materialized::Entries(entries) => Some(entries),
            Materialized::Map(_) => None,
        }
    }
}

/// Iterate over a blob file, wrapping each value in a [`LazyValue`].
///
/// With `allow_empty = false`, entries whose value is empty are skipped.
pub fn iterate_lazy<K, T>(
    path: impl AsRef<Path>,
    allow_empty: bool,
) -> Result<LazyEntries<K, T>, BlobError>
where
    K: DeserializeOwned + Send + 'static,
    T: DeserializeOwned + Payload + Send + Sync + 'static,
{
    let options = ReadOptions::default().with_allow_empty(allow_empty);
    iterate_lazy_with(&FileSource::new(path), &options)
}

/// Like [`iterate_lazy`], reading from any [`BlobSource`].
pub fn iterate_lazy_with<S, K, T>(
    source: &S,
    options: &ReadOptions,
) -> Result<LazyEntries<K, T>, BlobError>
where
    S: BlobSource + ?Sized,
    K: DeserializeOwned + Send + 'static,
    T: DeserializeOwned + Payload + Send + Sync + 'static,
{
    options.validate()?;
    debug!(source = source.id(), "opening blob for lazy iteration");
    iterate_lazy_from_reader(source.open()?, options)
}

/// Like [`iterate_lazy`], reading raw blob bytes from `reader`.
pub fn iterate_lazy_from_reader<R, K, T>(
    reader: R,
    options: &ReadOptions,
) -> Result<LazyEntries<K, T>, BlobError>
where
    R: std::io::Read + Send + 'static,
    K: DeserializeOwned + Send + 'static,
    T: DeserializeOwned + Payload + Send + Sync + 'static,
{
    options.validate()?;
    open_entries(reader, options, lazy_entry::<K, T>(options.allow_empty))
}

/// Iterate over a blob file, or load it whole.
///
/// `materialize` is a boolean or one of `"eager"` / `"lazy"` (any case);
/// other values fail with [`BlobError::Configuration`] before the file is
/// opened. Eager mode returns an ordered map of decoded values; lazy mode
/// returns the `(key, value)` iterator.
pub fn iterate_or_materialize<K, T>(
    path: impl AsRef<Path>,
    allow_empty: bool,
    materialize: impl Into<MaterializeSetting>,
) -> Result<Materialized<K, T>, BlobError>
where
    K: DeserializeOwned + Hash + Eq + Send + 'static,
    T: DeserializeOwned + Payload + Send + 'static,
{
    let options = ReadOptions::default()
        .with_allow_empty(allow_empty)
        .with_materialize(materialize);
    iterate_or_materialize_with(&FileSource::new(path), &options)
}

/// Like [`iterate_or_materialize`], reading from any [`BlobSource`].
pub fn iterate_or_materialize_with<S, K, T>(
    source: &S,
    options: &ReadOptions,
) -> Result<Materialized<K, T>, BlobError>
where
    S: BlobSource + ?Sized,
    K: DeserializeOwned + Hash + Eq + Send + 'static,
    T: DeserializeOwned + Payload + Send + 'static,
{
    options.validate()?;
    debug!(source = source.id(), "opening blob");
    iterate_or_materialize_from_reader(source.open()?, options)
}

/// Like [`iterate_or_materialize`], reading raw blob bytes from `reader`.
pub fn iterate_or_materialize_from_reader<R, K, T>(
    reader: R,
    options: &ReadOptions,
) -> Result<Materialized<K, T>, BlobError>
where
    R: std::io::Read + Send + 'static,
    K: DeserializeOwned + Hash + Eq + Send + 'static,
    T: DeserializeOwned + Payload + Send + 'static,
{
    options.validate()?;
    let mode = options.materialize_mode()?;
    let entries = open_entries(reader, options, decoded_entry::<K, T>(options.allow_empty))?;

    match mode {
        MaterializeMode::Lazy => Ok(Materialized::Entries(entries)),
        MaterializeMode::Eager => {
            let map = entries.collect::<Result<IndexMap<K, T>, BlobError>>()?;
            debug!(entries = map.len(), "blob materialized");
            Ok(Materialized::Map(map))
        }
    }
}

/// Start a streaming session or decode eagerly, depending on the backend.
fn open_entries<R, K, V, H>(
    reader: R,
    options: &ReadOptions,
    mut handler: H,
) -> Result<Entries<K, V>, BlobError>
where
    R: std::io::Read + Send + 'static,
    K: Send + 'static,
    V: Send + 'static,
    H: FnMut(String, Box<RawValue>) -> Result<Option<(K, V)>, BlobError> + Send + 'static,
{
    if options.backend.use_streaming()? {
        let decoder = StreamingMapDecoder::spawn(
            reader,
            options.compression,
            options.poll_interval(),
            handler,
        )?;
        return Ok(Entries::streaming(decoder));
    }

    let source = decompress(reader, options.compression)?;
    let mut entries = Vec::new();
    for (key, raw) in format::decode_eager(source)? {
        if let Some(entry) = handler(key, raw)? {
            entries.push(entry);
        }
    }
    debug!(entries = entries.len(), "eager decode finished");
    Ok(Entries::eager(entries))
}

/// Entry handler producing lazy proxies.
///
/// When empty entries are filtered out, the value is decoded once here to
/// test it and the proxy is built with a non-empty hint.
fn lazy_entry<K, T>(
    allow_empty: bool,
) -> impl FnMut(String, Box<RawValue>) -> Result<Option<(K, LazyValue<T>)>, BlobError>
+ Send
+ 'static
where
    K: DeserializeOwned + 'static,
    T: DeserializeOwned + Payload + 'static,
{
    move |key, raw| {
        let decoded_key = format::decode_key::<K>(&key)?;
        let hint = if allow_empty {
            None
        } else {
            let value: T = format::decode_payload(&key, &raw)?;
            if value.is_empty() {
                return Ok(None);
            }
            Some(false)
        };
        Ok(Some((decoded_key, LazyValue::from_raw(key, raw, hint))))
    }
}

/// Entry handler producing fully decoded values.
fn decoded_entry<K, T>(
    allow_empty: bool,
) -> impl FnMut(String, Box<RawValue>) -> Result<Option<(K, T)>, BlobError> + Send + 'static
where
    K: DeserializeOwned + 'static,
    T: DeserializeOwned + Payload + 'static,
{
    move |key, raw| {
        let decoded_key = format::decode_key::<K>(&key)?;
        let value: T = format::decode_payload(&key, &raw)?;
        if !allow_empty && value.is_empty() {
            return Ok(None);
        }
        Ok(Some((decoded_key, value)))
    }
}
