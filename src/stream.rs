//! Streaming decode of a blob's outermost mapping on a worker thread.
//!
//! One session owns one worker thread. The worker runs the decoder with the
//! sink container installed; every entry that survives the handler is passed
//! to the consumer through a single-slot channel, so at most one decoded
//! entry waits in the hand-off at any time.
//!
//! ```text
//! raw reader -> StopGuard -> decompress -> decoder -> sink -> handler
//!                                                              |
//!                        consumer <- bounded(1) channel <------+
//! ```
//!
//! Closing the session (explicitly or by dropping it) sets the stop flag,
//! disconnects the channel and joins the worker. The guard turns the flag
//! into a read failure, so no byte is read from the source once `close`
//! has returned.

use std::fmt;
use std::io::Read;
use std::iter::FusedIterator;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender};
use serde_json::value::RawValue;
use tracing::{debug, trace, warn};

use crate::error::BlobError;
use crate::format;
use crate::io::{Compression, StopGuard, decompress};

/// Lifecycle of a streaming session.
///
/// A session is `Decoding` as soon as it is returned. It moves to
/// `EntryEmitted` with the first delivered entry and ends in exactly one of
/// the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The worker is running and nothing has been delivered yet
    Decoding,
    /// At least one entry has been delivered
    EntryEmitted,
    /// The whole blob was decoded and every entry delivered
    Completed,
    /// The consumer closed the session before the end of the blob
    Cancelled,
    /// Decoding stopped on an error, which was delivered to the consumer
    Failed,
}

impl SessionState {
    /// Whether the session has ended.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed
        )
    }
}

enum Message<K, V> {
    Entry(K, V),
    End(Result<(), BlobError>),
}

/// Consumer side of a streaming decode session.
///
/// Yields `Ok((key, value))` in blob order. A decode failure is yielded as a
/// final `Err` item, after which the iterator is exhausted.
pub struct StreamingMapDecoder<K, V> {
    receiver: Option<Receiver<Message<K, V>>>,
    worker: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    state: SessionState,
    emitted: usize,
}

impl<K, V> StreamingMapDecoder<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    /// Start decoding `reader` on a new worker thread.
    ///
    /// `handler` turns each outermost entry into a typed pair, or returns
    /// `Ok(None)` to drop it. An error from `handler` ends the stream.
    pub fn spawn<R, H>(
        reader: R,
        compression: Compression,
        poll_interval: Duration,
        handler: H,
    ) -> Result<Self, BlobError>
    where
        R: Read + Send + 'static,
        H: FnMut(String, Box<RawValue>) -> Result<Option<(K, V)>, BlobError> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = crossbeam_channel::bounded(1);

        let producer = Producer {
            sender,
            stop: Arc::clone(&stop),
            poll_interval,
        };
        let worker = thread::Builder::new()
            .name("histblob-decode".to_string())
            .spawn(move || producer.run(reader, compression, handler))?;

        debug!("streaming decode session started");

        Ok(Self {
            receiver: Some(receiver),
            worker: Some(worker),
            stop,
            state: SessionState::Decoding,
            emitted: 0,
        })
    }
}

impl<K, V> StreamingMapDecoder<K, V> {
    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of entries delivered so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Stop the session and wait for the worker to exit.
    ///
    /// After this returns the worker has finished and the source will not be
    /// read again. Calling it on a finished session does nothing.
    pub fn close(&mut self) {
        if self.receiver.is_none() && self.worker.is_none() {
            return;
        }

        self.stop.store(true, Ordering::Release);
        self.receiver = None;
        if self.join_worker() {
            warn!("decode worker panicked during shutdown");
        }

        if !self.state.is_terminal() {
            self.state = SessionState::Cancelled;
            debug!(emitted = self.emitted, "streaming decode session cancelled");
        }
    }

    /// Join the worker, returning `true` if it panicked.
    fn join_worker(&mut self) -> bool {
        match self.worker.take() {
            Some(handle) => handle.join().is_err(),
            None => false,
        }
    }

    fn finish(&mut self, state: SessionState) {
        self.receiver = None;
        if self.join_worker() {
            warn!("decode worker panicked after sending its end marker");
        }
        self.state = state;
        debug!(emitted = self.emitted, ?state, "streaming decode session finished");
    }
}

impl<K, V> Iterator for StreamingMapDecoder<K, V> {
    type Item = Result<(K, V), BlobError>;

    fn next(&mut self) -> Option<Self::Item> {
        let receiver = self.receiver.as_ref()?;

        match receiver.recv() {
            Ok(Message::Entry(key, value)) => {
                self.state = SessionState::EntryEmitted;
                self.emitted += 1;
                Some(Ok((key, value)))
            }
            Ok(Message::End(Ok(()))) => {
                self.finish(SessionState::Completed);
                None
            }
            Ok(Message::End(Err(err))) => {
                self.finish(SessionState::Failed);
                Some(Err(err))
            }
            Err(_) => {
                // The worker only leaves without an end marker when it panics.
                self.receiver = None;
                let panicked = self.join_worker();
                warn!(panicked, "decode worker exited without an end marker");
                self.state = SessionState::Failed;
                Some(Err(BlobError::WorkerPanicked))
            }
        }
    }
}

impl<K, V> FusedIterator for StreamingMapDecoder<K, V> {}

impl<K, V> Drop for StreamingMapDecoder<K, V> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<K, V> fmt::Debug for StreamingMapDecoder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingMapDecoder")
            .field("state", &self.state)
            .field("emitted", &self.emitted)
            .field("worker_running", &self.worker.is_some())
            .finish()
    }
}

/// Worker side of a session.
struct Producer<K, V> {
    sender: Sender<Message<K, V>>,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl<K, V> Producer<K, V> {
    fn run<R, H>(self, reader: R, compression: Compression, mut handler: H)
    where
        R: Read + Send + 'static,
        H: FnMut(String, Box<RawValue>) -> Result<Option<(K, V)>, BlobError>,
    {
        let guarded = StopGuard::new(reader, Arc::clone(&self.stop));
        let mut sent = 0usize;
        let mut dropped = 0usize;

        let outcome = decompress(guarded, compression)
            .map_err(BlobError::from)
            .and_then(|source| {
                format::drive_sink(source, |key, raw| {
                    match handler(key, raw)? {
                        Some((key, value)) => {
                            self.send(Message::Entry(key, value))?;
                            sent += 1;
                        }
                        None => {
                            dropped += 1;
                            trace!(dropped, "entry filtered out");
                        }
                    }
                    Ok(())
                })
            });

        let cancelled = match &outcome {
            Err(err) => err.is_cancellation(),
            Ok(()) => false,
        };
        if cancelled || self.is_stopped() {
            trace!(sent, "worker observed stop signal");
            return;
        }

        debug!(sent, dropped, failed = outcome.is_err(), "streaming decode finished");
        // A failed send means the consumer closed in the meantime.
        let _ = self.send(Message::End(outcome));
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Hand a message to the consumer, waking up every poll interval to
    /// check whether the session was closed.
    fn send(&self, mut message: Message<K, V>) -> Result<(), BlobError> {
        loop {
            if self.is_stopped() {
                return Err(BlobError::cancelled());
            }
            match self.sender.send_timeout(message, self.poll_interval) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => message = returned,
                Err(SendTimeoutError::Disconnected(_)) => return Err(BlobError::cancelled()),
            }
        }
    }
}
