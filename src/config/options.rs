//! Read options for a single iteration session.

use std::time::Duration;

use serde::Deserialize;

use super::{MaterializeMode, MaterializeSetting};
use crate::HAS_STREAMING_SUPPORT;
use crate::error::BlobError;
use crate::io::Compression;

/// Decoding backend used by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Streaming when the runtime supports it, eager otherwise
    #[default]
    Auto,
    /// Decode on a worker thread and hand entries over one at a time
    Streaming,
    /// Decode the whole blob before yielding anything
    Eager,
}

impl Backend {
    /// Parse a backend from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Some(Backend::Auto),
            "streaming" | "stream" => Some(Backend::Streaming),
            "eager" => Some(Backend::Eager),
            _ => None,
        }
    }

    /// Whether this backend resolves to the streaming decoder.
    pub fn use_streaming(self) -> Result<bool, BlobError> {
        match self {
            Backend::Auto => Ok(HAS_STREAMING_SUPPORT),
            Backend::Eager => Ok(false),
            Backend::Streaming if HAS_STREAMING_SUPPORT => Ok(true),
            Backend::Streaming => Err(BlobError::Configuration(
                "streaming backend is not available on this runtime".into(),
            )),
        }
    }
}

/// Options for reading one blob.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Keep entries whose value is empty
    pub allow_empty: bool,
    /// Materialize setting: a boolean, "eager" or "lazy"
    pub materialize: MaterializeSetting,
    /// Decoding backend: "auto", "streaming" or "eager"
    pub backend: Backend,
    /// Compression of the raw bytes: "auto", "gzip" or "none"
    pub compression: Compression,
    /// How long the worker waits on a full hand-off slot before
    /// re-checking for cancellation
    pub poll_interval_ms: u64,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            allow_empty: true,
            materialize: MaterializeSetting::default(),
            backend: Backend::default(),
            compression: Compression::default(),
            poll_interval_ms: 10,
        }
    }
}

impl ReadOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep or drop empty entries.
    pub fn with_allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    /// Set the materialize setting.
    pub fn with_materialize(mut self, materialize: impl Into<MaterializeSetting>) -> Self {
        self.materialize = materialize.into();
        self
    }

    /// Set the decoding backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the compression of the raw bytes.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the worker's hand-off poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The worker's hand-off poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validated materialize mode.
    pub fn materialize_mode(&self) -> Result<MaterializeMode, BlobError> {
        self.materialize.resolve()
    }

    /// Check every option, returning the first problem found.
    pub fn validate(&self) -> Result<(), BlobError> {
        if self.poll_interval_ms == 0 {
            return Err(BlobError::Configuration(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }
        self.materialize_mode()?;
        self.backend.use_streaming()?;
        Ok(())
    }
}
