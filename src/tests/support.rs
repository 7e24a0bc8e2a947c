//! Shared fixtures for the internal tests.

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{Backend, ReadOptions};
use crate::format::Payload;

/// Stand-in for a histogram: an integer payload plus an emptiness flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Hist {
    pub payload: i64,
    #[serde(default)]
    pub empty: bool,
}

impl Hist {
    pub fn new(payload: i64, empty: bool) -> Self {
        Self { payload, empty }
    }
}

impl Payload for Hist {
    fn is_empty(&self) -> bool {
        self.empty
    }
}

/// Wire form shared by the instrumented payload types.
#[derive(Debug, Deserialize)]
pub(crate) struct HistRepr {
    pub payload: i64,
    #[serde(default)]
    pub empty: bool,
}

/// Declare a payload type that counts its decodes and live instances in the
/// statics `DECODES` and `LIVE`.
///
/// Use it inside a test function so every test gets its own counters.
macro_rules! instrumented_hist {
    ($name:ident) => {
        static DECODES: ::std::sync::atomic::AtomicUsize = ::std::sync::atomic::AtomicUsize::new(0);
        static LIVE: ::std::sync::atomic::AtomicUsize = ::std::sync::atomic::AtomicUsize::new(0);

        type InstrumentedRepr = $crate::tests::support::HistRepr;

        #[allow(dead_code)]
        #[derive(Debug, ::serde::Deserialize)]
        #[serde(from = "InstrumentedRepr")]
        struct $name {
            payload: i64,
            empty: bool,
        }

        impl From<InstrumentedRepr> for $name {
            fn from(repr: InstrumentedRepr) -> Self {
                DECODES.fetch_add(1, ::std::sync::atomic::Ordering::SeqCst);
                LIVE.fetch_add(1, ::std::sync::atomic::Ordering::SeqCst);
                Self {
                    payload: repr.payload,
                    empty: repr.empty,
                }
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                LIVE.fetch_sub(1, ::std::sync::atomic::Ordering::SeqCst);
            }
        }

        impl $crate::format::Payload for $name {
            fn is_empty(&self) -> bool {
                self.empty
            }
        }
    };
}

pub(crate) use instrumented_hist;

/// Encode `(key, payload, empty)` triples as a blob, in order.
pub(crate) fn blob(entries: &[(&str, i64, bool)]) -> String {
    let map: IndexMap<String, Hist> = entries
        .iter()
        .map(|(key, payload, empty)| ((*key).to_string(), Hist::new(*payload, *empty)))
        .collect();
    serde_json::to_string(&map).unwrap()
}

/// `{"a": V(0), "b": V(1, empty), "c": V(2)}`
pub(crate) fn abc_blob() -> String {
    blob(&[("a", 0, false), ("b", 1, true), ("c", 2, false)])
}

/// A blob with `n` non-empty entries keyed `h0`, `h1`, ...
pub(crate) fn numbered_blob(n: usize) -> String {
    let keys: Vec<String> = (0..n).map(|i| format!("h{i}")).collect();
    let entries: Vec<(&str, i64, bool)> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| (key.as_str(), i as i64, false))
        .collect();
    blob(&entries)
}

pub(crate) fn streaming() -> ReadOptions {
    ReadOptions::default().with_backend(Backend::Streaming)
}

pub(crate) fn eager() -> ReadOptions {
    ReadOptions::default().with_backend(Backend::Eager)
}

/// Reader that counts calls to `read` and caps each one at `max_chunk`
/// bytes.
pub(crate) struct CountingReader<R> {
    inner: R,
    reads: Arc<AtomicUsize>,
    max_chunk: usize,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R, reads: Arc<AtomicUsize>, max_chunk: usize) -> Self {
        Self {
            inner,
            reads,
            max_chunk,
        }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let n = buf.len().min(self.max_chunk);
        self.inner.read(&mut buf[..n])
    }
}

/// Reader that serves `ok` bytes and then fails.
pub(crate) struct FailingReader {
    data: io::Cursor<Vec<u8>>,
}

impl FailingReader {
    pub fn new(ok: impl Into<Vec<u8>>) -> Self {
        Self {
            data: io::Cursor::new(ok.into()),
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away")),
            n => Ok(n),
        }
    }
}
