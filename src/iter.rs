//! Cancellable streaming iterator
//!
//! A producer thread pushes items through a single-slot channel; the consumer
//! pulls them with `Iterator::next`. At most one item is in flight, so the
//! producer blocks until the consumer catches up.
//!
//! ```text
//!  producer thread                         consumer
//!  ┌──────────────┐  bounded(1) items    ┌──────────────┐
//!  │  IterSink    │ ───────────────────▶ │  StreamIter  │
//!  │              │ ◀─ ─ ─ ─ ─ ─ ─ ─ ─ ─ │  close()     │
//!  └──────────────┘  cancel (disconnect) └──────────────┘
//!          │                                    ▲
//!          └────── error slot (Mutex) ──────────┘
//! ```
//!
//! Errors never interrupt the stream mid-way: the producer records its error
//! and stops, the consumer sees the stream end and then checks `take_error`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, select, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::error::{Result, TableError};

type ErrorSlot = Arc<Mutex<Option<TableError>>>;

/// Consumer side of a producer-backed stream
pub struct StreamIter<T> {
    items: Option<Receiver<T>>,
    /// Never sent on; dropping it is the cancellation signal
    cancel: Option<Sender<()>>,
    error: ErrorSlot,
    handle: Option<JoinHandle<()>>,
}

/// Producer side handed to the producer closure
pub struct IterSink<T> {
    items: Sender<T>,
    cancel: Receiver<()>,
    error: ErrorSlot,
}

impl<T: Send + 'static> StreamIter<T> {
    /// Spawn `producer` on a named thread and return the consuming end
    ///
    /// If the producer returns an error it is stored on the iterator before the
    /// stream closes.
    pub fn spawn<F>(name: impl Into<String>, producer: F) -> Result<Self>
    where
        F: FnOnce(&IterSink<T>) -> Result<()> + Send + 'static,
    {
        let (item_tx, item_rx) = channel::bounded(1);
        let (cancel_tx, cancel_rx) = channel::bounded(0);
        let error: ErrorSlot = Arc::new(Mutex::new(None));

        let sink = IterSink {
            items: item_tx,
            cancel: cancel_rx,
            error: Arc::clone(&error),
        };

        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                if let Err(e) = producer(&sink) {
                    sink.set_error(e);
                }
            })
            .map_err(TableError::io("spawning iterator thread"))?;

        Ok(Self {
            items: Some(item_rx),
            cancel: Some(cancel_tx),
            error,
            handle: Some(handle),
        })
    }
}

impl<T> StreamIter<T> {
    /// A stream that yields nothing
    pub fn empty() -> Self {
        Self {
            items: None,
            cancel: None,
            error: Arc::new(Mutex::new(None)),
            handle: None,
        }
    }

    /// Stop the producer early and wait for it to exit
    ///
    /// Safe to call more than once. A producer busy inside a blocking call
    /// (opening or decompressing a file) finishes that call first.
    pub fn close(&mut self) {
        self.cancel.take();
        self.items.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                self.error
                    .lock()
                    .get_or_insert(TableError::Worker("iterator producer panicked".to_string()));
            }
        }
    }

    /// Take the producer's error, if it recorded one
    ///
    /// Check after the stream is exhausted; an empty stream plus an error means
    /// iteration halted early.
    pub fn take_error(&mut self) -> Option<TableError> {
        self.error.lock().take()
    }

    /// Whether the producer recorded an error
    pub fn has_error(&self) -> bool {
        self.error.lock().is_some()
    }

    /// Close and turn the recorded error into a `Result`
    pub fn finish(mut self) -> Result<()> {
        self.close();
        match self.take_error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T> Iterator for StreamIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.items.as_ref()?.recv().ok();
        if item.is_none() {
            // Producer is done; reap the thread so panics surface as errors
            self.close();
        }
        item
    }
}

impl<T> Drop for StreamIter<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> IterSink<T> {
    /// Push one item, blocking until the consumer takes the previous one
    ///
    /// Returns false once the consumer has closed or dropped the stream; the
    /// producer should stop.
    pub fn send(&self, item: T) -> bool {
        select! {
            send(self.items, item) -> res => res.is_ok(),
            recv(self.cancel) -> _ => false,
        }
    }

    /// Non-blocking check for cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cancel.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Record an error for the consumer; the first one wins
    pub fn set_error(&self, err: TableError) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}
