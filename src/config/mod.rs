//! Configuration types for blob reads.
//!
//! This module provides:
//! - `ReadOptions`: Options for a single iteration session
//! - `Backend`: Streaming or eager decoding
//! - `MaterializeMode` / `MaterializeSetting`: How entries are handed back

mod materialize;
mod options;

pub use materialize::{MaterializeMode, MaterializeSetting};
pub use options::{Backend, ReadOptions};
