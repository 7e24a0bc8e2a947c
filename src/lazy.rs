//! Deferred decoding of a single entry's payload.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::value::RawValue;

use crate::error::BlobError;
use crate::format::{self, Payload};

type DecodeFn<T> = Box<dyn Fn() -> Result<T, BlobError> + Send + Sync>;

enum Source<T> {
    Raw(Box<RawValue>),
    Deferred(DecodeFn<T>),
}

/// Proxy for one entry's value that decodes on first use.
///
/// The decoded instance is cached behind an `Arc`; repeated calls to
/// [`materialize`](LazyValue::materialize) return the same instance without
/// decoding again. [`release`](LazyValue::release) drops the cache while
/// keeping the payload, so the value can be materialized again later.
///
/// A `LazyValue` owns only its payload. It holds no reference to the decode
/// session that produced it and may outlive it.
pub struct LazyValue<T> {
    key: String,
    source: Source<T>,
    cached: OnceCell<Arc<T>>,
    empty: OnceCell<bool>,
    hint: Option<bool>,
}

impl<T> LazyValue<T>
where
    T: DeserializeOwned + Payload,
{
    /// Wrap the raw JSON text of an entry's value.
    ///
    /// `key` is only used in error messages.
    pub fn from_raw(key: impl Into<String>, raw: Box<RawValue>, empty_hint: Option<bool>) -> Self {
        Self::with_source(key.into(), Source::Raw(raw), empty_hint)
    }

    /// Wrap a decode closure, called on every (re-)materialization.
    pub fn from_fn<F>(key: impl Into<String>, decode: F, empty_hint: Option<bool>) -> Self
    where
        F: Fn() -> Result<T, BlobError> + Send + Sync + 'static,
    {
        Self::with_source(key.into(), Source::Deferred(Box::new(decode)), empty_hint)
    }

    /// Wrap an already decoded value.
    ///
    /// The value is re-encoded to raw JSON first, so the proxy does not keep
    /// the caller's instance alive.
    pub fn from_decoded(
        key: impl Into<String>,
        value: &T,
        empty_hint: Option<bool>,
    ) -> Result<Self, BlobError>
    where
        T: Serialize,
    {
        let raw = format::encode_payload(value)?;
        Ok(Self::from_raw(key, raw, empty_hint))
    }

    fn with_source(key: String, source: Source<T>, hint: Option<bool>) -> Self {
        let empty = match hint {
            Some(is_empty) => OnceCell::with_value(is_empty),
            None => OnceCell::new(),
        };
        Self {
            key,
            source,
            cached: OnceCell::new(),
            empty,
            hint,
        }
    }

    fn decode(&self) -> Result<T, BlobError> {
        match &self.source {
            Source::Raw(raw) => format::decode_payload(&self.key, raw),
            Source::Deferred(decode) => decode(),
        }
    }

    /// Decode the value on first call and return the cached instance.
    pub fn materialize(&self) -> Result<Arc<T>, BlobError> {
        self.cached
            .get_or_try_init(|| self.decode().map(Arc::new))
            .cloned()
    }

    /// Borrow the decoded value, materializing it if needed.
    pub fn get(&self) -> Result<&T, BlobError> {
        self.cached
            .get_or_try_init(|| self.decode().map(Arc::new))
            .map(|value| &**value)
    }

    /// Drop the cached instance. The payload is kept.
    pub fn release(&mut self) {
        self.cached.take();
    }

    /// Whether the value is empty.
    ///
    /// Uses the hint given at construction when there is one; otherwise
    /// materializes the value and caches its answer.
    pub fn is_empty(&self) -> Result<bool, BlobError> {
        self.empty
            .get_or_try_init(|| self.get().map(Payload::is_empty))
            .copied()
    }

    /// Whether a decoded instance is currently cached.
    pub fn is_materialized(&self) -> bool {
        self.cached.get().is_some()
    }

    /// The emptiness hint supplied at construction.
    pub fn empty_hint(&self) -> Option<bool> {
        self.hint
    }

    /// The raw JSON text of the payload, unless it is a decode closure.
    pub fn raw_payload(&self) -> Option<&str> {
        match &self.source {
            Source::Raw(raw) => Some(raw.get()),
            Source::Deferred(_) => None,
        }
    }

    /// The entry key this value was read under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> fmt::Debug for LazyValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Raw(raw) => format!("{} raw bytes", raw.get().len()),
            Source::Deferred(_) => "closure".to_owned(),
        };
        f.debug_struct("LazyValue")
            .field("key", &self.key)
            .field("source", &source)
            .field("materialized", &self.cached.get().is_some())
            .field("empty_hint", &self.hint)
            .finish()
    }
}
