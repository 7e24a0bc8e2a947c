//! I/O abstractions for blob sources.
//!
//! This module provides:
//! - `BlobSource`: Trait for anything that can open a blob's raw bytes
//! - `FileSource` / `InMemorySource`: standard implementations
//! - `StopGuard`: reader wrapper that refuses to read once a session stops
//! - `Compression`: gzip detection and the layered blob reader

mod compression;
mod guard;
mod input;
mod memory;
mod std_io;

pub use compression::{Compression, compressed_writer, decompress};
pub use guard::StopGuard;
pub use input::BlobSource;
pub use memory::InMemorySource;
pub use std_io::FileSource;
