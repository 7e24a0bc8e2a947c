//! Helpers for whole histogram collections: saving, loading and comparing.

use std::ffi::OsString;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use crate::engine::iterate_or_materialize;
use crate::error::BlobError;
use crate::format::Payload;
use crate::io::compressed_writer;

/// File suffix of a gzip-compressed blob.
pub const BLOB_EXTENSION: &str = ".json.gz";

/// Write `entries` as a gzip-compressed blob.
///
/// [`BLOB_EXTENSION`] is appended to `path` when missing. Returns the path
/// actually written.
pub fn dump_blob<K, V>(
    path: impl AsRef<Path>,
    entries: &IndexMap<K, V>,
) -> Result<PathBuf, BlobError>
where
    K: Serialize,
    V: Serialize,
{
    let path = blob_path(path.as_ref());
    info!(path = %path.display(), entries = entries.len(), "saving blob");

    let file = File::create(&path)?;
    let mut writer = compressed_writer(BufWriter::new(file));
    serde_json::to_writer(&mut writer, entries).map_err(|e| BlobError::Encode(e.to_string()))?;
    writer.finish()?.flush()?;

    info!(path = %path.display(), "blob saved");
    Ok(path)
}

fn blob_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().ends_with(BLOB_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(BLOB_EXTENSION);
    PathBuf::from(name)
}

/// Load a whole blob into an ordered map.
///
/// With `allow_empty = false`, entries whose value is empty are left out.
pub fn load_blob<K, T>(
    path: impl AsRef<Path>,
    allow_empty: bool,
) -> Result<IndexMap<K, T>, BlobError>
where
    K: DeserializeOwned + Hash + Eq + Send + 'static,
    T: DeserializeOwned + Payload + Send + 'static,
{
    iterate_or_materialize(path, allow_empty, true)?.into_map()
}

/// Drop every entry whose value is empty, keeping the order of the rest.
pub fn retain_non_empty<K, T: Payload>(entries: &mut IndexMap<K, T>) {
    entries.retain(|_, value| !value.is_empty());
}

/// How the keys of two collections overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOverlap<K> {
    /// Keys present in both, in the first collection's order
    pub common: Vec<K>,
    /// Keys only in the first collection
    pub only_first: Vec<K>,
    /// Keys only in the second collection, in its order
    pub only_second: Vec<K>,
}

/// Compare the key sets of two collections.
pub fn common_keys<K, A, B>(first: &IndexMap<K, A>, second: &IndexMap<K, B>) -> KeyOverlap<K>
where
    K: Hash + Eq + Clone,
{
    let (common, only_first) = first
        .keys()
        .cloned()
        .partition(|key| second.contains_key(key));
    let only_second = second
        .keys()
        .filter(|key| !first.contains_key(*key))
        .cloned()
        .collect();

    KeyOverlap {
        common,
        only_first,
        only_second,
    }
}
