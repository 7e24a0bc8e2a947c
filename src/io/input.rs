//! Blob source trait definition.

use std::fmt::Debug;
use std::io::Read;

/// Trait for synchronous blob sources.
///
/// Implementors provide a way to open a readable stream of the blob's raw
/// (possibly compressed) bytes.
pub trait BlobSource: Send + Sync + Debug {
    /// Returns a unique identifier for this source.
    ///
    /// This is used for logging. Convention: the file path for files.
    fn id(&self) -> &str;

    /// Open and return a new readable stream.
    ///
    /// Each call should return a fresh stream positioned at the beginning.
    fn open(&self) -> std::io::Result<Box<dyn Read + Send>>;
}
