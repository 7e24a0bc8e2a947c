//! # histblob
//!
//! Streaming and lazy loading of large keyed histogram collections stored
//! as a single blob.
//!
//! ## Overview
//!
//! A blob is one JSON object, usually gzip-compressed, mapping keys to
//! heavyweight values. histblob provides:
//! - **Streaming decode**: entries are handed over one at a time as the
//!   blob is parsed, with at most one decoded entry waiting in between
//! - **Lazy values**: each value can be wrapped in a [`LazyValue`] that
//!   decodes on first use and can be released again
//! - **Filtering**: entries whose value is empty can be skipped
//! - **Cancellation**: closing or dropping an iterator stops the decoder;
//!   no byte is read from the source afterwards
//! - **Eager fallback**: the same contract without a worker thread, for
//!   runtimes where [`HAS_STREAMING_SUPPORT`] is false
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use histblob::{HistKey, LazyValue, Payload, iterate_lazy};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Hist {
//!     counts: Vec<f64>,
//! }
//!
//! impl Payload for Hist {
//!     fn is_empty(&self) -> bool {
//!         self.counts.iter().all(|c| *c == 0.0)
//!     }
//! }
//!
//! fn main() -> Result<(), histblob::BlobError> {
//!     for entry in iterate_lazy::<HistKey, Hist>("histos.json.gz", false)? {
//!         let (key, value) = entry?;
//!         if key.parts()[0] == "njets" {
//!             println!("{key}: {:?}", value.materialize()?.counts);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `streaming` - Worker-thread streaming backend (enabled by default)
//! - `miette` - Pretty error reporting with miette
//!
//! ## Memory model
//!
//! - The streaming backend captures each entry's value as raw bytes before
//!   decoding it, so peak memory is bounded by the largest single entry plus
//!   the entry waiting in the hand-off slot.
//! - The eager backend decodes the whole blob first and re-encodes each
//!   value, trading memory for an identical interface.
//! - `iterate_or_materialize` in eager mode drains every entry into an
//!   `IndexMap`, so it holds the whole collection by design.

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod hist;
pub mod io;
pub mod lazy;
pub mod stream;

// Re-exports for convenience
pub use config::{Backend, MaterializeMode, MaterializeSetting, ReadOptions};
pub use engine::{
    Entries, LazyEntries, Materialized, iterate_lazy, iterate_lazy_from_reader, iterate_lazy_with,
    iterate_or_materialize, iterate_or_materialize_from_reader, iterate_or_materialize_with,
};
pub use error::{BlobError, StopSignal};
pub use format::{HistKey, Payload};
pub use hist::{KeyOverlap, common_keys, dump_blob, load_blob, retain_non_empty};
pub use io::{BlobSource, Compression, FileSource, InMemorySource, StopGuard};
pub use lazy::LazyValue;
pub use stream::{SessionState, StreamingMapDecoder};

// Miette re-exports
#[cfg(feature = "miette")]
pub use error::BlobDiagnostic;

/// Whether the streaming backend can run here.
///
/// Requires the `streaming` feature and a target that can spawn OS threads.
/// `Backend::Auto` falls back to eager decoding when this is false.
pub const HAS_STREAMING_SUPPORT: bool =
    cfg!(all(feature = "streaming", not(target_family = "wasm")));
