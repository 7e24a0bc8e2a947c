//! Error types for blob decoding.
//!
//! This module provides:
//! - `BlobError`: every failure surfaced by the public API
//! - `StopSignal`: internal marker used to unwind a cancelled decode session

use std::fmt;
use std::io;

use serde_json::error::Category;
use thiserror::Error;

/// Errors that can occur while loading a blob.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The root value of the blob is not a key/value container.
    #[error("blob does not contain a single top-level associative container")]
    NotAMapping,

    /// The blob is not valid JSON, ends early, or has trailing data.
    #[error("malformed blob: {message}")]
    Malformed {
        /// Line of the offending byte (1-based, 0 when unknown)
        line: usize,
        /// Column of the offending byte (1-based, 0 when unknown)
        column: usize,
        /// Message reported by the decoder
        message: String,
    },

    /// An entry's key or value does not decode into the requested types.
    #[error("failed to decode entry '{key}': {message}")]
    Payload {
        /// The key as written in the blob
        key: String,
        /// Message reported by the decoder, without source position
        message: String,
    },

    /// A value could not be re-encoded into its raw payload form.
    #[error("failed to encode payload: {0}")]
    Encode(String),

    /// I/O error from the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid read options, such as an unknown materialize mode
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The decode worker thread panicked before finishing the stream.
    #[error("decode worker panicked")]
    WorkerPanicked,
}

impl BlobError {
    /// Returns `true` for errors describing the blob's structure rather than
    /// its transport or its payloads.
    pub fn is_format_error(&self) -> bool {
        matches!(self, BlobError::NotAMapping | BlobError::Malformed { .. })
    }

    pub(crate) fn payload(key: &str, err: &dyn fmt::Display) -> Self {
        BlobError::Payload {
            key: key.to_owned(),
            message: err.to_string(),
        }
    }

    pub(crate) fn cancelled() -> Self {
        BlobError::Io(StopSignal.into_io_error())
    }

    /// Whether this error is the unwinding of a cancelled session.
    pub(crate) fn is_cancellation(&self) -> bool {
        matches!(self, BlobError::Io(err) if StopSignal::is_stop(err))
    }

    /// Map a decoder error onto the crate taxonomy.
    ///
    /// `saw_root` tells whether the outermost container had already been
    /// entered when the error happened; a type mismatch before that point
    /// means the root is not a mapping.
    pub(crate) fn from_json(err: serde_json::Error, saw_root: bool) -> Self {
        match err.classify() {
            Category::Io => BlobError::Io(err.into()),
            Category::Data if !saw_root => BlobError::NotAMapping,
            _ => BlobError::Malformed {
                line: err.line(),
                column: err.column(),
                message: err.to_string(),
            },
        }
    }
}

/// Payload error message without the trailing source position.
///
/// Entry payloads are decoded from their own raw text, whose layout differs
/// between a blob read verbatim and one re-encoded by the eager path, so the
/// position is dropped to keep messages identical across both.
pub(crate) fn bare_message(err: &serde_json::Error) -> String {
    let full = err.to_string();
    if err.line() == 0 {
        return full;
    }
    let suffix = format!(" at line {} column {}", err.line(), err.column());
    match full.strip_suffix(&suffix) {
        Some(bare) => bare.to_owned(),
        None => full,
    }
}

/// Raised by the byte-source guard once the session's stop flag is set.
///
/// Travels inside an `io::Error` so it unwinds the decoder like any other
/// read failure; the session recognises it and ends the stream cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopSignal;

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decode session was cancelled")
    }
}

impl std::error::Error for StopSignal {}

impl StopSignal {
    pub(crate) fn into_io_error(self) -> io::Error {
        io::Error::other(self)
    }

    /// Check whether an I/O error carries a stop signal.
    pub fn is_stop(err: &io::Error) -> bool {
        err.get_ref().is_some_and(|inner| inner.is::<StopSignal>())
    }
}

#[cfg(feature = "miette")]
mod miette_impl;

#[cfg(feature = "miette")]
pub use miette_impl::*;
