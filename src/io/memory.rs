//! In-memory blob source, mostly for tests and benchmarks.

use std::io::{self, Cursor, Read};
use std::sync::Arc;

use super::BlobSource;

/// In-memory blob source.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    id: String,
    data: Arc<Vec<u8>>,
}

impl InMemorySource {
    /// Create a new in-memory source with the given data.
    pub fn new(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            data: Arc::new(data),
        }
    }

    /// Create a new in-memory source from a string.
    pub fn from_string(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(id, data.into().into_bytes())
    }

    /// Length of the stored blob in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the stored blob is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl BlobSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(&self.data)))))
    }
}

/// Shares the source buffer with every opened reader instead of copying it.
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
