//! Cancellation guard for the raw byte source of a decode session.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::StopSignal;

/// Reader wrapper that checks a shared stop flag before every read.
///
/// Once the flag is observed set, every call fails with an error carrying
/// [`StopSignal`] and the inner reader is never touched again. Errors from
/// the inner reader pass through unchanged.
pub struct StopGuard<R> {
    inner: R,
    stop: Arc<AtomicBool>,
}

impl<R> StopGuard<R> {
    /// Wrap `inner`, watching `stop`.
    pub fn new(inner: R, stop: Arc<AtomicBool>) -> Self {
        Self { inner, stop }
    }

    /// Whether the guard has been tripped.
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Unwrap the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for StopGuard<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_stopped() {
            return Err(StopSignal.into_io_error());
        }
        self.inner.read(buf)
    }
}

impl<R> fmt::Debug for StopGuard<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopGuard")
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}
